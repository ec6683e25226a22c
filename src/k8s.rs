pub mod checks;
pub mod resources;

pub use checks::{DeprecatedApi, ObjectFinding, ServedApis, WalkOptions, WalkResults, get_deprecated_apis, walk_objects};

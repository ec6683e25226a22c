pub mod cache;
pub mod index;
pub mod recognizer;

pub use cache::{Acquired, CacheOptions, Origin, acquire};
pub use index::{ApiDefinition, Classification, GroupVersionKind, SpecIndex, build};
pub use recognizer::{Deprecation, DeprecationRecognizer, MarkerRecognizer};

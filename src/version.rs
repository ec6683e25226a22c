use std::fmt;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Sentinel used for the latest development snapshot of the Kubernetes API
pub const SNAPSHOT: &str = "master";

/// Kubernetes release the cluster objects are validated against
///
/// Release tags are immutable upstream and can be cached forever, whereas the development
/// snapshot moves over time. Keeping the two apart in the type also keeps them apart in the
/// cache key so that a snapshot download is never mistaken for a tagged release
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetVersion {
  /// Moving development snapshot, identified by its git ref (e.g. `master`)
  Snapshot(String),
  /// Immutable release tag (e.g. `v1.25.0`)
  Tag(String),
}

impl TargetVersion {
  /// Parse the user supplied version
  ///
  /// Accepts `master`/`latest`, `1.25`, `v1.25` and `v1.25.3`. Minor-only versions
  /// resolve to the `.0` patch release tag
  pub fn parse(version: &str) -> Result<Self> {
    let version = version.trim();
    if version.is_empty() {
      bail!("Kubernetes version must not be empty");
    }

    let lowered = version.to_ascii_lowercase();
    if lowered == SNAPSHOT || lowered == "latest" {
      return Ok(TargetVersion::Snapshot(SNAPSHOT.to_owned()));
    }

    let stripped = version.trim_start_matches('v');
    let parts: Vec<&str> = stripped.split('.').collect();
    if !(2..=3).contains(&parts.len()) {
      bail!("Invalid Kubernetes version '{version}', expected 'master' or 'X.Y[.Z]'");
    }
    for part in &parts {
      part
        .parse::<u32>()
        .with_context(|| format!("Invalid Kubernetes version '{version}', expected 'master' or 'X.Y[.Z]'"))?;
    }

    let patch = parts.get(2).copied().unwrap_or("0");
    Ok(TargetVersion::Tag(format!("v{}.{}.{patch}", parts[0], parts[1])))
  }

  /// The git ref used to locate the specification upstream
  pub fn git_ref(&self) -> &str {
    match self {
      TargetVersion::Snapshot(git_ref) => git_ref,
      TargetVersion::Tag(tag) => tag,
    }
  }

  pub fn is_snapshot(&self) -> bool {
    matches!(self, TargetVersion::Snapshot(_))
  }

  /// File name used to cache the specification of this version
  pub fn cache_file_name(&self) -> String {
    match self {
      TargetVersion::Snapshot(git_ref) => format!("swagger-snapshot-{git_ref}.json"),
      TargetVersion::Tag(tag) => format!("swagger-{tag}.json"),
    }
  }
}

impl fmt::Display for TargetVersion {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.git_ref())
  }
}

/// Normalize a loosely formatted version (`1.25`, `v1.25+`) into `v1.25`
pub(crate) fn normalize(version: &str) -> String {
  format!("v{}", version.trim().trim_end_matches('+').trim_start_matches('v'))
}

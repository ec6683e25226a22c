use std::{
  fs,
  io::Write,
  path::{Path, PathBuf},
  time::{Duration, SystemTime},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
  clients::SpecSource,
  error::{Error, Result},
  finding::Warning,
  openapi::index,
  version::TargetVersion,
};

/// Default maximum age of a cached development snapshot before it is downloaded again
pub const DEFAULT_SNAPSHOT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Where the specification bytes handed back by [`acquire`] came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
  Cache,
  Download,
}

#[derive(Debug)]
pub struct Acquired {
  pub bytes: Vec<u8>,
  pub origin: Origin,
  /// Set when the download could not be persisted; the bytes are still usable for this run
  pub warning: Option<Warning>,
}

#[derive(Clone, Debug)]
pub struct CacheOptions {
  pub dir: PathBuf,
  pub force_download: bool,
  pub snapshot_max_age: Duration,
}

impl Default for CacheOptions {
  fn default() -> Self {
    Self {
      dir: PathBuf::from("."),
      force_download: false,
      snapshot_max_age: DEFAULT_SNAPSHOT_MAX_AGE,
    }
  }
}

/// Path of the cache entry for the given version
pub fn cache_path(dir: &Path, version: &TargetVersion) -> PathBuf {
  dir.join(version.cache_file_name())
}

/// Returns the specification for `version`, from the cache when a valid entry exists
///
/// A missing, unreadable, malformed or (for snapshots) stale entry falls through to a
/// download, which then replaces the entry atomically
pub async fn acquire<S: SpecSource>(source: &S, version: &TargetVersion, options: &CacheOptions) -> Result<Acquired> {
  let path = cache_path(&options.dir, version);

  if !options.force_download
    && let Some(bytes) = read_cached(&path, version, options.snapshot_max_age)
  {
    info!("Using cached API specification {}", path.display());
    return Ok(Acquired {
      bytes,
      origin: Origin::Cache,
      warning: None,
    });
  }

  info!("Downloading API specification for {version}");
  let bytes = source.fetch(version).await?;
  index::validate(&bytes)?;

  let warning = match persist(&options.dir, &path, &bytes) {
    Ok(()) => {
      debug!("Cached API specification at {}", path.display());
      None
    }
    Err(err) => {
      warn!("{err}");
      Some(Warning::cache_write(&err))
    }
  };

  Ok(Acquired {
    bytes,
    origin: Origin::Download,
    warning,
  })
}

fn read_cached(path: &Path, version: &TargetVersion, max_age: Duration) -> Option<Vec<u8>> {
  let metadata = fs::metadata(path).ok()?;
  if !metadata.is_file() {
    return None;
  }

  if version.is_snapshot() {
    let age = metadata
      .modified()
      .ok()
      .and_then(|modified| SystemTime::now().duration_since(modified).ok())
      .unwrap_or_default();
    if age > max_age {
      debug!("Cached snapshot {} is {}s old, refreshing", path.display(), age.as_secs());
      return None;
    }
  }

  let bytes = match fs::read(path) {
    Ok(bytes) => bytes,
    Err(err) => {
      warn!("Unable to read cached API specification {}: {err}", path.display());
      return None;
    }
  };

  match index::validate(&bytes) {
    Ok(()) => Some(bytes),
    Err(err) => {
      warn!("Ignoring invalid cached API specification {}: {err}", path.display());
      None
    }
  }
}

/// Write to a temporary file next to the target and rename it into place
fn persist(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
  let to_error = |message: String| Error::CacheWrite {
    path: path.display().to_string(),
    message,
  };

  fs::create_dir_all(dir).map_err(|e| to_error(e.to_string()))?;
  let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| to_error(e.to_string()))?;
  file.write_all(bytes).map_err(|e| to_error(e.to_string()))?;
  file.as_file().sync_all().map_err(|e| to_error(e.to_string()))?;
  file.persist(path).map_err(|e| to_error(e.error.to_string()))?;

  Ok(())
}

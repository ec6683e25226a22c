use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
  error::{Error, Result},
  version,
};

/// Marker token that flags a definition as deprecated in the upstream descriptions
pub const DEFAULT_MARKER: &str = "deprecated";

/// Matches removal notes such as `unavailable in v1.25+` or `removed in 1.22`
pub const DEFAULT_REMOVAL_PATTERN: &str = r"(?i)(?:unavailable|removed)\s+in\s+v?(\d+\.\d+(?:\.\d+)?)";

/// Deprecation state extracted from a definition description
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deprecation {
  pub deprecated: bool,
  /// Kubernetes version where the API is no longer served, when stated
  pub removed_in: Option<String>,
}

/// Recognizes deprecation metadata in the free-text description of an API definition
///
/// Upstream does not publish deprecation as a structured field, so the convention used
/// to detect it lives behind this trait and can be swapped without touching the index
pub trait DeprecationRecognizer: Send + Sync {
  fn recognize(&self, description: &str) -> Deprecation;
}

/// Default recognizer: a case-insensitive marker token plus a removal version pattern
#[derive(Clone, Debug)]
pub struct MarkerRecognizer {
  marker: String,
  removal: Regex,
}

impl MarkerRecognizer {
  pub fn new(marker: &str, removal_pattern: &str) -> Result<Self> {
    if marker.trim().is_empty() {
      return Err(Error::Config {
        message: "deprecation marker must not be empty".to_string(),
      });
    }

    let removal = Regex::new(removal_pattern).map_err(|e| Error::Config {
      message: format!("invalid removal pattern '{removal_pattern}': {e}"),
    })?;
    if removal.captures_len() < 2 {
      return Err(Error::Config {
        message: format!("removal pattern '{removal_pattern}' must contain a capture group for the version"),
      });
    }

    Ok(Self {
      marker: marker.to_lowercase(),
      removal,
    })
  }
}

impl Default for MarkerRecognizer {
  fn default() -> Self {
    Self {
      marker: DEFAULT_MARKER.to_string(),
      removal: Regex::new(DEFAULT_REMOVAL_PATTERN).expect("default removal pattern is valid"),
    }
  }
}

impl DeprecationRecognizer for MarkerRecognizer {
  fn recognize(&self, description: &str) -> Deprecation {
    let deprecated = description.to_lowercase().contains(&self.marker);
    let removed_in = self
      .removal
      .captures(description)
      .and_then(|caps| caps.get(1))
      .map(|m| version::normalize(m.as_str()));

    Deprecation { deprecated, removed_in }
  }
}

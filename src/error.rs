use thiserror::Error;

/// Errors raised while acquiring the API specification or inspecting the cluster
///
/// `CacheWrite` and `ResourceList` are never fatal on their own; callers turn them
/// into report warnings and keep going
#[derive(Error, Debug)]
pub enum Error {
  #[error("Unable to fetch API specification for {version} from {url}: {message}")]
  Fetch {
    version: String,
    url: String,
    message: String,
  },

  #[error("Unable to write API specification cache file {path}: {message}")]
  CacheWrite { path: String, message: String },

  #[error("API specification document is malformed: {message}")]
  Parse { message: String },

  #[error("Cluster discovery failed: {message}")]
  Discovery { message: String },

  #[error("Unable to list {resource}: {message}")]
  ResourceList { resource: String, message: String },

  #[error("Invalid configuration: {message}")]
  Config { message: String },
}

impl Error {
  pub fn parse(message: impl Into<String>) -> Self {
    Error::Parse {
      message: message.into(),
    }
  }

  pub fn discovery(err: impl std::fmt::Display) -> Self {
    Error::Discovery {
      message: err.to_string(),
    }
  }

  pub fn resource_list(resource: &str, err: impl std::fmt::Display) -> Self {
    Error::ResourceList {
      resource: resource.to_owned(),
      message: err.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

use std::sync::atomic::{AtomicUsize, Ordering};

use deprecheck::{
  clients::SpecSource,
  error::{Error, Result},
  version::TargetVersion,
};

/// Mock specification source that counts its fetches
#[derive(Default)]
pub struct MockSpecSource {
  pub document: Vec<u8>,
  pub calls: AtomicUsize,
}

impl MockSpecSource {
  pub fn new(document: Vec<u8>) -> Self {
    Self {
      document,
      calls: AtomicUsize::new(0),
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

impl SpecSource for MockSpecSource {
  async fn fetch(&self, _version: &TargetVersion) -> Result<Vec<u8>> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.document.clone())
  }
}

/// Mock that fails every fetch as an unreachable server would
pub struct MockSpecSourceError;

impl SpecSource for MockSpecSourceError {
  async fn fetch(&self, version: &TargetVersion) -> Result<Vec<u8>> {
    Err(Error::Fetch {
      version: version.to_string(),
      url: "https://example.invalid/swagger.json".to_string(),
      message: "connection refused".to_string(),
    })
  }
}

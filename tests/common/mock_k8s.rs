use std::{
  collections::BTreeMap,
  sync::atomic::{AtomicUsize, Ordering},
};

use deprecheck::{
  clients::K8sClients,
  error::{Error, Result},
  finding::Warning,
  k8s::resources::{Discovered, LiveObject, ResourceType},
};

/// Mock K8s client for testing
///
/// Objects are keyed by the resource path they are listed from
#[derive(Clone, Default)]
pub struct MockK8sClients {
  pub resources: Vec<ResourceType>,
  pub objects: BTreeMap<String, Vec<LiveObject>>,
  /// Resource paths whose list call fails
  pub forbidden: Vec<String>,
  /// Group versions whose discovery document cannot be retrieved
  pub unavailable: Vec<String>,
}

impl MockK8sClients {
  pub fn with_objects(mut self, resource: ResourceType, objects: Vec<LiveObject>) -> Self {
    self.objects.insert(resource.path(), objects);
    self.resources.push(resource);
    self
  }
}

impl K8sClients for MockK8sClients {
  async fn discover(&self) -> Result<Discovered> {
    let warnings = self
      .unavailable
      .iter()
      .map(|group_version| {
        Warning::group_discovery(group_version, &Error::discovery("the server is currently unable to handle the request"))
      })
      .collect();

    Ok(Discovered {
      resources: self.resources.clone(),
      warnings,
    })
  }

  async fn list_objects(&self, resource: &ResourceType, _page_size: u32) -> Result<Vec<LiveObject>> {
    let path = resource.path();
    if self.forbidden.contains(&path) {
      return Err(Error::resource_list(&path, "forbidden: User cannot list resource"));
    }

    Ok(self.objects.get(&path).cloned().unwrap_or_default())
  }
}

/// Mock whose first `failures` discovery calls fail
pub struct MockK8sClientsFlakyDiscovery {
  pub inner: MockK8sClients,
  pub failures: usize,
  pub calls: AtomicUsize,
}

impl MockK8sClientsFlakyDiscovery {
  pub fn new(inner: MockK8sClients, failures: usize) -> Self {
    Self {
      inner,
      failures,
      calls: AtomicUsize::new(0),
    }
  }
}

impl K8sClients for MockK8sClientsFlakyDiscovery {
  async fn discover(&self) -> Result<Discovered> {
    if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
      return Err(Error::discovery("mock discovery error"));
    }
    self.inner.discover().await
  }

  async fn list_objects(&self, resource: &ResourceType, page_size: u32) -> Result<Vec<LiveObject>> {
    self.inner.list_objects(resource, page_size).await
  }
}

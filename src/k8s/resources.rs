use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResourceList;
use kube::{
  Client,
  api::{Api, ApiResource, DynamicObject, ListParams},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
  error::{Error, Result},
  finding::Warning,
  openapi::GroupVersionKind,
};

/// A resource type served by the API server, as reported by discovery
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceType {
  pub gvk: GroupVersionKind,
  /// Plural resource name used in URLs (e.g. `deployments`)
  pub plural: String,
  pub namespaced: bool,
  pub verbs: Vec<String>,
}

impl ResourceType {
  pub fn new(group: &str, version: &str, kind: &str, plural: &str, namespaced: bool) -> Self {
    Self {
      gvk: GroupVersionKind::new(group, version, kind),
      plural: plural.to_owned(),
      namespaced,
      verbs: vec!["get".to_owned(), "list".to_owned(), "watch".to_owned()],
    }
  }

  /// `group/version/plural`, or `version/plural` for the core group
  pub fn path(&self) -> String {
    format!("{}/{}", self.gvk.api_version(), self.plural)
  }

  pub fn supports_list(&self) -> bool {
    self.verbs.iter().any(|verb| verb == "list")
  }
}

impl fmt::Display for ResourceType {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.path())
  }
}

/// Reference to a single object stored in the cluster
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveObject {
  pub api_version: String,
  pub kind: String,
  pub name: String,
  /// `None` for cluster scoped objects
  pub namespace: Option<String>,
  /// Resource path the object was listed from
  pub resource: String,
}

impl LiveObject {
  pub fn new(resource: &ResourceType, name: &str, namespace: Option<&str>) -> Self {
    Self {
      api_version: resource.gvk.api_version(),
      kind: resource.gvk.kind.to_owned(),
      name: name.to_owned(),
      namespace: namespace.map(str::to_owned),
      resource: resource.path(),
    }
  }
}

/// Outcome of discovery: the served resource types and the group versions left out
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Discovered {
  pub resources: Vec<ResourceType>,
  /// One `Discovery` warning per group version whose resources could not be retrieved
  pub warnings: Vec<Warning>,
}

impl Discovered {
  /// Sorts the resource types and drops types reported twice
  pub fn finish(mut self) -> Self {
    self.resources.sort();
    self.resources.dedup_by(|a, b| a.gvk == b.gvk && a.plural == b.plural);
    self.warnings.sort();
    self
  }
}

/// Converts one discovery document into resource types, dropping subresources
pub(crate) fn resource_types(group: &str, version: &str, list: &APIResourceList) -> Vec<ResourceType> {
  list
    .resources
    .iter()
    .filter(|resource| !resource.name.contains('/'))
    .map(|resource| ResourceType {
      gvk: GroupVersionKind::new(
        resource.group.as_deref().unwrap_or(group),
        resource.version.as_deref().unwrap_or(version),
        &resource.kind,
      ),
      plural: resource.name.to_owned(),
      namespaced: resource.namespaced,
      verbs: resource.verbs.clone(),
    })
    .collect()
}

/// Returns every resource type served by the cluster, across all served versions
///
/// All versions of a group are walked rather than only the preferred one, since
/// objects can still be requested (and stored) through older versions. A group version
/// whose discovery document cannot be retrieved (commonly an unavailable aggregated API)
/// is skipped and reported in [`Discovered::warnings`]
pub async fn discover(client: &Client) -> Result<Discovered> {
  let mut discovered = Discovered::default();

  let core = client.list_core_api_versions().await.map_err(Error::discovery)?;
  for version in &core.versions {
    let list = client
      .list_core_api_resources(version)
      .await
      .map_err(Error::discovery)?;
    discovered.resources.extend(resource_types("", version, &list));
  }

  let groups = client.list_api_groups().await.map_err(Error::discovery)?;
  for group in &groups.groups {
    for version in &group.versions {
      match client.list_api_group_resources(&version.group_version).await {
        Ok(list) => discovered
          .resources
          .extend(resource_types(&group.name, &version.version, &list)),
        Err(err) => {
          warn!("Skipping API group version {}: {err}", version.group_version);
          discovered
            .warnings
            .push(Warning::group_discovery(&version.group_version, &Error::discovery(err)));
        }
      }
    }
  }

  let discovered = discovered.finish();
  debug!(
    "Discovered {} resource types, {} group versions skipped",
    discovered.resources.len(),
    discovered.warnings.len()
  );

  Ok(discovered)
}

/// Lists every instance of the resource type, page by page
pub async fn list_objects(client: &Client, resource: &ResourceType, page_size: u32) -> Result<Vec<LiveObject>> {
  let gvk = kube::core::GroupVersionKind::gvk(&resource.gvk.group, &resource.gvk.version, &resource.gvk.kind);
  let api_resource = ApiResource::from_gvk_with_plural(&gvk, &resource.plural);
  let api: Api<DynamicObject> = Api::all_with(client.clone(), &api_resource);
  let path = resource.path();

  let mut params = ListParams::default().limit(page_size);
  let mut objects = Vec::new();
  loop {
    let list = api
      .list(&params)
      .await
      .map_err(|e| Error::resource_list(&path, e))?;

    objects.extend(list.items.iter().map(|obj| {
      LiveObject::new(
        resource,
        obj.metadata.name.as_deref().unwrap_or_default(),
        obj.metadata.namespace.as_deref(),
      )
    }));

    match list.metadata.continue_ {
      Some(token) if !token.is_empty() => params = params.continue_token(&token),
      _ => break,
    }
  }

  debug!("Listed {} objects from {path}", objects.len());
  Ok(objects)
}

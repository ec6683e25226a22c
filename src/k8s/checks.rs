use std::collections::BTreeSet;

use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
  clients::K8sClients,
  error::Result,
  finding::{self, Code, Finding, Findings, Remediation, Warning},
  k8s::resources::{LiveObject, ResourceType},
  openapi::{ApiDefinition, Classification, GroupVersionKind, SpecIndex},
  output::tabled_option_to_string,
  pool::{self, PoolOptions},
};

/// Default number of objects requested per list call
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// A deprecated API kind that the API server still serves
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Tabled)]
#[tabled(rename_all = "UpperCase")]
pub struct DeprecatedApi {
  #[tabled(inline)]
  pub finding: finding::Finding,
  pub group: String,
  pub version: String,
  pub kind: String,
  #[tabled(rename = "REMOVED IN", display = "tabled_option_to_string")]
  pub removed_in: Option<String>,
  /// Upstream description; usually names the replacement API
  pub description: String,
}

impl DeprecatedApi {
  fn new(api: &ApiDefinition, show_description: bool) -> Self {
    Self {
      finding: Finding::new(Code::API001, Remediation::Recommended),
      group: api.group.to_owned(),
      version: api.version.to_owned(),
      kind: api.kind.to_owned(),
      removed_in: api.removed_in.to_owned(),
      description: if show_description {
        api.description.to_owned()
      } else {
        String::new()
      },
    }
  }
}

finding::impl_findings!(DeprecatedApi, "✅ - No deprecated APIs are served by the cluster");

/// A stored object whose API kind is deprecated or no longer exists in the target version
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Tabled)]
#[tabled(rename_all = "UpperCase")]
pub struct ObjectFinding {
  #[tabled(inline)]
  pub finding: finding::Finding,
  #[tabled(skip)]
  pub group: String,
  #[tabled(skip)]
  pub version: String,
  #[tabled(rename = "API VERSION")]
  pub api_version: String,
  pub kind: String,
  #[tabled(display = "tabled_option_to_string")]
  pub namespace: Option<String>,
  pub name: String,
  #[tabled(rename = "REMOVED IN", display = "tabled_option_to_string")]
  pub removed_in: Option<String>,
}

impl ObjectFinding {
  fn new(gvk: &GroupVersionKind, object: &LiveObject, finding: Finding, removed_in: Option<String>) -> Self {
    Self {
      finding,
      group: gvk.group.to_owned(),
      version: gvk.version.to_owned(),
      api_version: gvk.api_version(),
      kind: gvk.kind.to_owned(),
      namespace: object.namespace.to_owned(),
      name: object.name.to_owned(),
      removed_in,
    }
  }

  fn sort_key(&self) -> (&str, &str, &str, Option<&str>, &str) {
    (
      self.group.as_str(),
      self.version.as_str(),
      self.kind.as_str(),
      self.namespace.as_deref(),
      self.name.as_str(),
    )
  }
}

finding::impl_findings!(ObjectFinding, "✅ - No objects stored with deprecated or removed APIs");

/// Returns the advertised kinds that the index marks as deprecated
///
/// Kinds missing from the index are not reported here; whether anything actually uses
/// them is decided by the object walk
pub fn deprecated_apis(index: &SpecIndex, advertised: &[ResourceType], show_description: bool) -> Vec<DeprecatedApi> {
  let advertised: BTreeSet<&GroupVersionKind> = advertised.iter().map(|resource| &resource.gvk).collect();

  advertised
    .into_iter()
    .filter_map(|gvk| match index.classify(gvk) {
      Classification::Deprecated(api) => Some(DeprecatedApi::new(&api, show_description)),
      _ => None,
    })
    .collect()
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServedApis {
  pub findings: Vec<DeprecatedApi>,
  /// Group versions left out of discovery
  pub warnings: Vec<Warning>,
}

/// Discovers the served API kinds and reports the deprecated ones
pub async fn get_deprecated_apis<K: K8sClients>(
  client: &K,
  index: &SpecIndex,
  show_description: bool,
) -> Result<ServedApis> {
  let discovered = client.discover().await?;
  let findings = deprecated_apis(index, &discovered.resources, show_description);
  info!("Found {} deprecated APIs served by the cluster", findings.len());

  Ok(ServedApis {
    findings,
    warnings: discovered.warnings,
  })
}

/// Settings for walking the objects stored in the cluster
#[derive(Clone, Debug)]
pub struct WalkOptions {
  pub page_size: u32,
  pub pool: PoolOptions,
  /// Entries of the form `group` or `group/Kind`; the core group is the empty string
  pub ignore: Vec<String>,
  /// Draw a progress bar on stderr while listing
  pub progress: bool,
}

impl Default for WalkOptions {
  fn default() -> Self {
    Self {
      page_size: DEFAULT_PAGE_SIZE,
      pool: PoolOptions::default(),
      ignore: Vec::new(),
      progress: false,
    }
  }
}

impl WalkOptions {
  pub fn is_ignored(&self, gvk: &GroupVersionKind) -> bool {
    self.ignore.iter().any(|entry| match entry.rsplit_once('/') {
      Some((group, kind)) => group == gvk.group && kind == gvk.kind,
      None => entry == &gvk.group,
    })
  }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WalkResults {
  pub findings: Vec<ObjectFinding>,
  pub warnings: Vec<Warning>,
  /// Set when the walk was cancelled before every resource type was listed
  pub partial: bool,
}

/// Classifies one stored object; current kinds yield nothing
pub fn classify(index: &SpecIndex, resource: &ResourceType, object: &LiveObject) -> Option<ObjectFinding> {
  match index.classify(&resource.gvk) {
    Classification::Current => None,
    Classification::Deprecated(api) => Some(ObjectFinding::new(
      &resource.gvk,
      object,
      Finding::new(Code::API002, Remediation::Recommended),
      api.removed_in,
    )),
    Classification::Removed(gvk) => Some(ObjectFinding::new(
      &gvk,
      object,
      Finding::new(Code::API003, Remediation::Required),
      None,
    )),
  }
}

/// Lists every object in the cluster and reports the ones stored with deprecated or removed kinds
///
/// A resource type that cannot be listed, or a group version that cannot be discovered, is
/// reported as a warning and does not stop the walk
pub async fn walk_objects<K: K8sClients>(
  client: &K,
  index: &SpecIndex,
  options: &WalkOptions,
  cancel: &CancellationToken,
) -> Result<WalkResults> {
  let discovered = client.discover().await?;
  let resources: Vec<ResourceType> = discovered
    .resources
    .into_iter()
    .filter(|resource| resource.supports_list())
    .filter(|resource| {
      let ignored = options.is_ignored(&resource.gvk);
      if ignored {
        debug!("Ignoring {resource}");
      }
      !ignored
    })
    .collect();

  info!("Listing objects of {} resource types", resources.len());
  let progress = if options.progress {
    ProgressBar::new(resources.len() as u64)
  } else {
    ProgressBar::hidden()
  };

  let completed = pool::run_bounded(resources, &options.pool, cancel, |resource| {
    let progress = &progress;
    async move {
      let listed = client.list_objects(&resource, options.page_size).await;
      progress.inc(1);
      (resource, listed)
    }
  })
  .await;
  progress.finish_and_clear();

  let mut results = WalkResults {
    warnings: discovered.warnings,
    ..Default::default()
  };
  for (resource, listed) in completed.outputs {
    match listed {
      Ok(objects) => results
        .findings
        .extend(objects.iter().filter_map(|object| classify(index, &resource, object))),
      Err(err) => {
        warn!("{err}");
        results.warnings.push(Warning::resource_list(&resource.path(), &err));
      }
    }
  }

  if completed.skipped > 0 {
    warn!("Walk cancelled with {} resource types left to list", completed.skipped);
    results.warnings.push(Warning::cancelled(completed.skipped));
    results.partial = true;
  }

  results.findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
  results.warnings.sort();

  Ok(results)
}

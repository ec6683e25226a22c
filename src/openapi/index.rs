use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  error::{Error, Result},
  openapi::recognizer::DeprecationRecognizer,
};

/// Identifies an API shape; the core group is represented by an empty `group`
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupVersionKind {
  pub group: String,
  pub version: String,
  pub kind: String,
}

impl GroupVersionKind {
  pub fn new(group: &str, version: &str, kind: &str) -> Self {
    Self {
      group: group.to_owned(),
      version: version.to_owned(),
      kind: kind.to_owned(),
    }
  }

  /// The `apiVersion` as written in manifests (`v1` for core, `group/version` otherwise)
  pub fn api_version(&self) -> String {
    if self.group.is_empty() {
      self.version.to_owned()
    } else {
      format!("{}/{}", self.group, self.version)
    }
  }
}

impl fmt::Display for GroupVersionKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}/{}", self.api_version(), self.kind)
  }
}

/// An API kind as described by the specification document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDefinition {
  pub group: String,
  pub version: String,
  pub kind: String,
  pub deprecated: bool,
  /// Upstream description, which often carries the replacement API to migrate to
  pub description: String,
  pub removed_in: Option<String>,
}

impl ApiDefinition {
  pub fn gvk(&self) -> GroupVersionKind {
    GroupVersionKind::new(&self.group, &self.version, &self.kind)
  }
}

/// Result of checking an API kind against the index
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
  /// Present and not deprecated
  Current,
  /// Present but marked as deprecated
  Deprecated(ApiDefinition),
  /// Not present at all in the target version
  Removed(GroupVersionKind),
}

/// Lookup of every API kind known to one version of the specification
///
/// Built once, then only ever read; the lister and the walker borrow it concurrently
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecIndex {
  apis: BTreeMap<GroupVersionKind, ApiDefinition>,
}

impl SpecIndex {
  pub fn get(&self, gvk: &GroupVersionKind) -> Option<&ApiDefinition> {
    self.apis.get(gvk)
  }

  pub fn classify(&self, gvk: &GroupVersionKind) -> Classification {
    match self.apis.get(gvk) {
      Some(api) if api.deprecated => Classification::Deprecated(api.clone()),
      Some(_) => Classification::Current,
      None => Classification::Removed(gvk.clone()),
    }
  }

  pub fn len(&self) -> usize {
    self.apis.len()
  }

  pub fn is_empty(&self) -> bool {
    self.apis.is_empty()
  }

  pub fn deprecated_count(&self) -> usize {
    self.apis.values().filter(|api| api.deprecated).count()
  }
}

impl FromIterator<ApiDefinition> for SpecIndex {
  fn from_iter<I: IntoIterator<Item = ApiDefinition>>(iter: I) -> Self {
    let mut apis = BTreeMap::new();
    for api in iter {
      apis.entry(api.gvk()).or_insert(api);
    }
    SpecIndex { apis }
  }
}

#[derive(Deserialize)]
struct Document {
  definitions: BTreeMap<String, Definition>,
}

#[derive(Deserialize)]
struct Definition {
  #[serde(default)]
  description: Option<String>,
  /// Vendor extension tying the definition to the API kind(s) it describes
  #[serde(rename = "x-kubernetes-group-version-kind", default)]
  gvks: Vec<RawGvk>,
}

#[derive(Deserialize)]
struct RawGvk {
  #[serde(default)]
  group: String,
  version: String,
  kind: String,
}

fn parse_document(bytes: &[u8]) -> Result<Document> {
  serde_json::from_slice(bytes).map_err(|e| Error::parse(e.to_string()))
}

/// Checks that the bytes are a structurally valid specification document
pub fn validate(bytes: &[u8]) -> Result<()> {
  parse_document(bytes).map(|_| ())
}

/// Builds the index of API kinds from the raw specification document
///
/// Definitions without the group/version/kind extension (parameter schemas, shared types)
/// are skipped. Definitions are visited in key order, so when two of them claim the
/// same kind the first one wins and the result never depends on document ordering
pub fn build(bytes: &[u8], recognizer: &dyn DeprecationRecognizer) -> Result<SpecIndex> {
  let document = parse_document(bytes)?;

  let mut apis: BTreeMap<GroupVersionKind, ApiDefinition> = BTreeMap::new();
  for (name, definition) in document.definitions {
    if definition.gvks.is_empty() {
      continue;
    }

    let description = definition.description.unwrap_or_default();
    let deprecation = recognizer.recognize(&description);

    for raw in definition.gvks {
      let gvk = GroupVersionKind::new(&raw.group, &raw.version, &raw.kind);
      if apis.contains_key(&gvk) {
        debug!("Skipping duplicate definition {name} for {gvk}");
        continue;
      }

      apis.insert(
        gvk,
        ApiDefinition {
          group: raw.group,
          version: raw.version,
          kind: raw.kind,
          deprecated: deprecation.deprecated,
          description: description.clone(),
          removed_in: deprecation.removed_in.clone(),
        },
      );
    }
  }

  debug!("Indexed {} API kinds", apis.len());

  Ok(SpecIndex { apis })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::openapi::recognizer::MarkerRecognizer;

  const DOCUMENT: &str = r#"{
    "definitions": {
      "io.k8s.api.apps.v1.Deployment": {
        "description": "Deployment enables declarative updates for Pods and ReplicaSets.",
        "x-kubernetes-group-version-kind": [{"group": "apps", "kind": "Deployment", "version": "v1"}]
      },
      "io.k8s.api.core.v1.Pod": {
        "description": "Pod is a collection of containers that can run on a host.",
        "x-kubernetes-group-version-kind": [{"group": "", "kind": "Pod", "version": "v1"}]
      },
      "io.k8s.api.policy.v1beta1.PodSecurityPolicy": {
        "description": "PodSecurityPolicy governs the ability to make requests. Deprecated in 1.21, unavailable in 1.25.",
        "x-kubernetes-group-version-kind": [{"group": "policy", "kind": "PodSecurityPolicy", "version": "v1beta1"}]
      },
      "io.k8s.api.core.v1.PodSpec": {
        "description": "PodSpec is a description of a pod."
      },
      "io.k8s.apimachinery.pkg.apis.meta.v1.DeleteOptions": {
        "description": "DeleteOptions may be provided when deleting an API object.",
        "x-kubernetes-group-version-kind": [
          {"group": "", "kind": "DeleteOptions", "version": "v1"},
          {"group": "apps", "kind": "DeleteOptions", "version": "v1"}
        ]
      }
    }
  }"#;

  fn index() -> SpecIndex {
    build(DOCUMENT.as_bytes(), &MarkerRecognizer::default()).unwrap()
  }

  #[test]
  fn indexes_only_kinds_with_extension() {
    let index = index();
    assert_eq!(index.len(), 5);
    assert!(index.get(&GroupVersionKind::new("", "v1", "PodSpec")).is_none());
    assert!(index.get(&GroupVersionKind::new("", "v1", "Pod")).is_some());
    assert!(index.get(&GroupVersionKind::new("apps", "v1", "DeleteOptions")).is_some());
  }

  #[test]
  fn records_deprecation_metadata() {
    let index = index();
    let psp = index
      .get(&GroupVersionKind::new("policy", "v1beta1", "PodSecurityPolicy"))
      .unwrap();
    assert!(psp.deprecated);
    assert_eq!(psp.removed_in.as_deref(), Some("v1.25"));
    assert!(psp.description.starts_with("PodSecurityPolicy governs"));

    let deployment = index.get(&GroupVersionKind::new("apps", "v1", "Deployment")).unwrap();
    assert!(!deployment.deprecated);
    assert_eq!(deployment.removed_in, None);
    assert_eq!(index.deprecated_count(), 1);
  }

  #[test]
  fn build_is_deterministic() {
    assert_eq!(index(), index());
  }

  #[test]
  fn classify_kinds() {
    let index = index();
    assert_eq!(
      index.classify(&GroupVersionKind::new("apps", "v1", "Deployment")),
      Classification::Current
    );
    assert!(matches!(
      index.classify(&GroupVersionKind::new("policy", "v1beta1", "PodSecurityPolicy")),
      Classification::Deprecated(_)
    ));

    let ingress = GroupVersionKind::new("extensions", "v1beta1", "Ingress");
    assert_eq!(index.classify(&ingress), Classification::Removed(ingress.clone()));
  }

  #[test]
  fn first_definition_wins_on_duplicate_kind() {
    let document = r#"{
      "definitions": {
        "a.Widget": {
          "description": "current widget",
          "x-kubernetes-group-version-kind": [{"group": "example.com", "kind": "Widget", "version": "v1"}]
        },
        "b.Widget": {
          "description": "deprecated widget",
          "x-kubernetes-group-version-kind": [{"group": "example.com", "kind": "Widget", "version": "v1"}]
        }
      }
    }"#;
    let index = build(document.as_bytes(), &MarkerRecognizer::default()).unwrap();
    let widget = index.get(&GroupVersionKind::new("example.com", "v1", "Widget")).unwrap();
    assert_eq!(widget.description, "current widget");
    assert!(!widget.deprecated);
  }

  #[test]
  fn malformed_documents_fail() {
    let recognizer = MarkerRecognizer::default();
    let truncated = &DOCUMENT.as_bytes()[..DOCUMENT.len() / 2];
    assert!(matches!(build(truncated, &recognizer), Err(Error::Parse { .. })));
    assert!(matches!(build(b"{}", &recognizer), Err(Error::Parse { .. })));
    assert!(matches!(build(br#"{"definitions": []}"#, &recognizer), Err(Error::Parse { .. })));
    assert!(matches!(build(b"not json", &recognizer), Err(Error::Parse { .. })));
  }

  #[test]
  fn validate_accepts_well_formed_documents() {
    assert!(validate(DOCUMENT.as_bytes()).is_ok());
    assert!(validate(br#"{"definitions": {}}"#).is_ok());
    assert!(validate(b"{\"definitions\": {").is_err());
  }

  #[test]
  fn api_version_formatting() {
    assert_eq!(GroupVersionKind::new("", "v1", "Pod").api_version(), "v1");
    assert_eq!(GroupVersionKind::new("apps", "v1", "Deployment").api_version(), "apps/v1");
    assert_eq!(GroupVersionKind::new("apps", "v1", "Deployment").to_string(), "apps/v1/Deployment");
  }
}

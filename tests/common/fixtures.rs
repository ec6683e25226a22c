use deprecheck::{
  k8s::resources::{LiveObject, ResourceType},
  openapi::{self, MarkerRecognizer, SpecIndex},
};
use serde_json::json;

use super::mock_k8s::MockK8sClients;

pub const PSP_DESCRIPTION: &str =
  "PodSecurityPolicy governs the ability to make requests. Deprecated in v1.21+, unavailable in v1.25+.";

/// A trimmed down `swagger.json` with one deprecated kind
pub fn spec_document() -> Vec<u8> {
  let document = json!({
    "swagger": "2.0",
    "definitions": {
      "io.k8s.api.apps.v1.Deployment": {
        "description": "Deployment enables declarative updates for Pods and ReplicaSets.",
        "x-kubernetes-group-version-kind": [{"group": "apps", "kind": "Deployment", "version": "v1"}]
      },
      "io.k8s.api.core.v1.Pod": {
        "description": "Pod is a collection of containers that can run on a host.",
        "x-kubernetes-group-version-kind": [{"group": "", "kind": "Pod", "version": "v1"}]
      },
      "io.k8s.api.core.v1.PodSpec": {
        "description": "PodSpec is a description of a pod."
      },
      "io.k8s.api.networking.v1.Ingress": {
        "description": "Ingress is a collection of rules that allow inbound connections to reach the endpoints defined by a backend.",
        "x-kubernetes-group-version-kind": [{"group": "networking.k8s.io", "kind": "Ingress", "version": "v1"}]
      },
      "io.k8s.api.policy.v1beta1.PodSecurityPolicy": {
        "description": PSP_DESCRIPTION,
        "x-kubernetes-group-version-kind": [{"group": "policy", "kind": "PodSecurityPolicy", "version": "v1beta1"}]
      }
    }
  });

  serde_json::to_vec_pretty(&document).unwrap()
}

pub fn spec_index() -> SpecIndex {
  openapi::build(&spec_document(), &MarkerRecognizer::default()).unwrap()
}

pub fn deployments() -> ResourceType {
  ResourceType::new("apps", "v1", "Deployment", "deployments", true)
}

pub fn pods() -> ResourceType {
  ResourceType::new("", "v1", "Pod", "pods", true)
}

pub fn legacy_ingresses() -> ResourceType {
  ResourceType::new("extensions", "v1beta1", "Ingress", "ingresses", true)
}

pub fn pod_security_policies() -> ResourceType {
  ResourceType::new("policy", "v1beta1", "PodSecurityPolicy", "podsecuritypolicies", false)
}

pub fn object(resource: &ResourceType, name: &str, namespace: Option<&str>) -> LiveObject {
  LiveObject::new(resource, name, namespace)
}

/// Cluster with one current, one deprecated and one removed kind in use
pub fn mixed_cluster() -> MockK8sClients {
  let deployments = deployments();
  let psp = pod_security_policies();
  let ingresses = legacy_ingresses();

  MockK8sClients::default()
    .with_objects(deployments.clone(), vec![object(&deployments, "web", Some("default"))])
    .with_objects(psp.clone(), vec![object(&psp, "restricted", None)])
    .with_objects(ingresses.clone(), vec![object(&ingresses, "legacy", Some("default"))])
}

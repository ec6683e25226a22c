use std::{fmt, future::Future, path::Path, time::Duration};

use kube::config::{KubeConfigOptions, Kubeconfig};
use tracing::debug;

use crate::{
  error::{Error, Result},
  k8s::resources::{self as k8s_resources, Discovered, LiveObject, ResourceType},
  version::TargetVersion,
};

/// Location the upstream API specification is published under, per git ref
pub const DEFAULT_SPEC_BASE_URL: &str = "https://raw.githubusercontent.com/kubernetes/kubernetes";

/// Upper bound on downloading the specification, including reading the body
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(120);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait abstracting all Kubernetes API operations used by deprecheck
pub trait K8sClients {
  /// Resource types served by the API server across all groups and versions, plus the
  /// group versions that could not be discovered
  fn discover(&self) -> impl Future<Output = Result<Discovered>> + Send;
  /// Every instance of the resource type across all namespaces, following pagination
  fn list_objects(&self, resource: &ResourceType, page_size: u32) -> impl Future<Output = Result<Vec<LiveObject>>> + Send;
}

/// Source of raw API specification documents
pub trait SpecSource {
  fn fetch(&self, version: &TargetVersion) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Real Kubernetes client implementation wrapping kube-rs
pub struct RealK8sClients {
  client: kube::Client,
}

impl RealK8sClients {
  /// Connects using `kubeconfig` when given, otherwise the in-cluster environment or the
  /// default kubeconfig. `options` selects a context, cluster or user other than the current one
  pub async fn new(kubeconfig: Option<&Path>, options: &KubeConfigOptions) -> anyhow::Result<Self> {
    let config = match kubeconfig {
      Some(path) => {
        let kubeconfig = Kubeconfig::read_from(path).map_err(connect_error)?;
        kube::Config::from_custom_kubeconfig(kubeconfig, options)
          .await
          .map_err(connect_error)?
      }
      None if options.context.is_some() || options.cluster.is_some() || options.user.is_some() => {
        kube::Config::from_kubeconfig(options).await.map_err(connect_error)?
      }
      None => kube::Config::infer().await.map_err(connect_error)?,
    };

    let client = kube::Client::try_from(config).map_err(connect_error)?;
    Ok(Self { client })
  }
}

fn connect_error(e: impl fmt::Display) -> anyhow::Error {
  anyhow::anyhow!(
    "Unable to connect to cluster: {e}\n\n\
    Ensure a kubeconfig file is present and the selected context points at the cluster,\n\
    or run from within the cluster with a service account"
  )
}

impl K8sClients for RealK8sClients {
  async fn discover(&self) -> Result<Discovered> {
    k8s_resources::discover(&self.client).await
  }

  async fn list_objects(&self, resource: &ResourceType, page_size: u32) -> Result<Vec<LiveObject>> {
    k8s_resources::list_objects(&self.client, resource, page_size).await
  }
}

/// Downloads the `swagger.json` published in the Kubernetes repository
pub struct HttpSpecSource {
  base_url: String,
  http: reqwest::Client,
}

impl HttpSpecSource {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
    let http = reqwest::Client::builder()
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .connect_timeout(CONNECT_TIMEOUT.min(timeout))
      .timeout(timeout)
      .build()
      .map_err(|e| Error::Config {
        message: format!("unable to construct HTTP client: {e}"),
      })?;

    Ok(Self {
      base_url: base_url.trim_end_matches('/').to_owned(),
      http,
    })
  }

  pub fn url(&self, version: &TargetVersion) -> String {
    format!("{}/{}/api/openapi-spec/swagger.json", self.base_url, version.git_ref())
  }
}

impl SpecSource for HttpSpecSource {
  async fn fetch(&self, version: &TargetVersion) -> Result<Vec<u8>> {
    let url = self.url(version);
    let to_error = |message: String| Error::Fetch {
      version: version.to_string(),
      url: url.clone(),
      message,
    };

    debug!("GET {url}");
    let response = self.http.get(&url).send().await.map_err(|e| to_error(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
      return Err(to_error(format!("server responded with {status}")));
    }

    let bytes = response.bytes().await.map_err(|e| to_error(e.to_string()))?;
    Ok(bytes.to_vec())
  }
}

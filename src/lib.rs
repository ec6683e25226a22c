pub mod analysis;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod finding;
pub mod k8s;
pub mod openapi;
pub mod output;
pub mod pool;
pub mod version;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use cli::Cli;
use clients::{HttpSpecSource, K8sClients, RealK8sClients, SpecSource};
use config::Config;
use openapi::{CacheOptions, MarkerRecognizer};
use version::TargetVersion;

/// Analyze the cluster selected by the kubeconfig flags and write the report
pub async fn analyze(args: &Cli, cancel: &CancellationToken) -> Result<analysis::Results> {
  let config = config::load(args.config.as_deref())?;
  let source = HttpSpecSource::new(&config.source.base_url, config.source.fetch_timeout())?;
  let client = RealK8sClients::new(args.kubeconfig.as_deref(), &args.kube_config_options()).await?;

  // All checks and validations on input should happen above/before running the analysis
  let results = check(args, &config, &client, &source, cancel).await?;
  output::output(&results, args.format, args.output.as_deref())?;

  Ok(results)
}

/// Acquire the specification, index it and check the cluster against it
pub async fn check<K: K8sClients, S: SpecSource>(
  args: &Cli,
  config: &Config,
  client: &K,
  source: &S,
  cancel: &CancellationToken,
) -> Result<analysis::Results> {
  let target = TargetVersion::parse(&args.k8s_version)?;
  let recognizer: MarkerRecognizer = config.recognizer.build()?;

  let mut warnings = Vec::new();
  let bytes = match &args.spec_file {
    Some(path) => {
      info!("Reading API specification from {}", path.display());
      std::fs::read(path).with_context(|| format!("Failed to read API specification {}", path.display()))?
    }
    None => {
      let options = CacheOptions {
        dir: args.swagger_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
        force_download: args.force_download,
        snapshot_max_age: config.source.snapshot_max_age(),
      };
      let acquired = openapi::acquire(source, &target, &options).await?;
      warnings.extend(acquired.warning);
      acquired.bytes
    }
  };

  let index = openapi::build(&bytes, &recognizer).context("Unable to index the API specification")?;
  info!(
    "Indexed {} API kinds for Kubernetes {target}, {} deprecated",
    index.len(),
    index.deprecated_count()
  );

  let mut pool = config.walk.pool();
  if let Some(concurrency) = args.concurrency {
    pool.concurrency = concurrency;
  }
  let options = analysis::AnalysisOptions {
    show_description: args.description,
    api_walk: args.api_walk,
    walk: k8s::WalkOptions {
      page_size: config.walk.page_size,
      pool,
      ignore: config.walk.ignore.clone(),
      progress: args.output.is_none() && args.format == output::Format::Text,
    },
  };

  analysis::analyze(client, &index, &target, &options, cancel, warnings).await
}

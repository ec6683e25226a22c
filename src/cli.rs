use std::path::PathBuf;

use anstyle::{AnsiColor, Effects, Style};
use clap::{ArgAction, Parser, builder::Styles};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use kube::config::KubeConfigOptions;

use crate::{output, version};

const HEADER: Style = AnsiColor::Yellow.on_default().effects(Effects::BOLD);
const LITERAL: Style = AnsiColor::Green.on_default().effects(Effects::BOLD);
const PLACEHOLDER: Style = AnsiColor::Cyan.on_default();

fn styles() -> Styles {
  Styles::styled()
    .header(HEADER)
    .usage(HEADER)
    .literal(LITERAL)
    .placeholder(PLACEHOLDER)
}

/// Find deprecated and removed Kubernetes APIs in use by a running cluster
#[derive(Parser, Debug)]
#[command(author, about, version)]
#[command(styles = styles())]
pub struct Cli {
  /// Kubernetes version to check against: `master`, `1.25`, `v1.25` or `v1.25.3`
  #[arg(long, default_value = version::SNAPSHOT)]
  pub k8s_version: String,

  /// Directory the downloaded API specification is cached in (defaults to the current directory)
  #[arg(long)]
  pub swagger_dir: Option<PathBuf>,

  /// Download the API specification even when a cached copy exists
  #[arg(long)]
  pub force_download: bool,

  /// Read the API specification from a local file instead of downloading it
  #[arg(long, conflicts_with_all = ["swagger_dir", "force_download"])]
  pub spec_file: Option<PathBuf>,

  /// Walk every object stored in the cluster, not only the served APIs
  #[arg(long, default_value_t = true, action = ArgAction::Set)]
  pub api_walk: bool,

  /// Include the upstream description of deprecated APIs
  #[arg(long, default_value_t = true, action = ArgAction::Set)]
  pub description: bool,

  #[arg(short, long, value_enum, default_value_t)]
  pub format: output::Format,

  /// Write to file instead of stdout
  #[arg(short, long)]
  pub output: Option<String>,

  /// Maximum number of concurrent list calls against the API server
  #[arg(long)]
  pub concurrency: Option<usize>,

  /// Stop scheduling list calls after this many seconds and report partial results
  #[arg(long)]
  pub timeout: Option<u64>,

  /// Path to the kubeconfig file (defaults to `KUBECONFIG` or `~/.kube/config`)
  #[arg(long)]
  pub kubeconfig: Option<PathBuf>,

  /// Name of the kubeconfig context to use instead of the current one
  #[arg(long)]
  pub context: Option<String>,

  /// Name of the kubeconfig cluster to use
  #[arg(long)]
  pub cluster: Option<String>,

  /// Path to the configuration file (defaults to `.deprecheck.yaml` in the current directory)
  #[arg(short, long)]
  pub config: Option<String>,

  /// Exit with a non-zero status when deprecated (not only removed) APIs are found
  #[arg(long)]
  pub error_on_deprecated: bool,

  #[clap(flatten)]
  pub verbose: Verbosity<WarnLevel>,
}

impl Cli {
  /// Kubeconfig context and cluster selection
  pub fn kube_config_options(&self) -> KubeConfigOptions {
    KubeConfigOptions {
      context: self.context.clone(),
      cluster: self.cluster.clone(),
      user: None,
    }
  }
}

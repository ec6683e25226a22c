use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
  clients::K8sClients,
  finding::{Findings, Remediation, Warning, WarningKind},
  k8s::{self, DeprecatedApi, ObjectFinding, WalkOptions, WalkResults},
  openapi::SpecIndex,
  version::TargetVersion,
};

/// Container of all findings collected
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Results {
  pub target_version: String,
  /// Deprecated API kinds the cluster still serves
  pub deprecated_apis: Vec<DeprecatedApi>,
  /// Objects stored with a deprecated or removed API kind
  pub deprecated_objects: Vec<ObjectFinding>,
  pub warnings: Vec<Warning>,
  /// Set when the run was cancelled before every resource type was listed
  pub partial: bool,
}

impl Results {
  /// True when an object uses an API kind that does not exist in the target version
  pub fn has_removed(&self) -> bool {
    self
      .deprecated_objects
      .iter()
      .any(|object| object.finding.remediation == Remediation::Required)
  }

  pub fn has_deprecated(&self) -> bool {
    !self.deprecated_apis.is_empty() || !self.deprecated_objects.is_empty()
  }

  /// True when a group version or resource type could not be checked
  pub fn has_unchecked(&self) -> bool {
    self
      .warnings
      .iter()
      .any(|warning| matches!(warning.kind, WarningKind::Discovery | WarningKind::ResourceList))
  }

  pub fn to_stdout_table(&self) -> Result<String> {
    let mut output = String::new();

    output.push_str(&self.deprecated_apis.to_stdout_table()?);
    output.push_str(&self.deprecated_objects.to_stdout_table()?);
    output.push_str(&self.warnings.to_stdout_table()?);

    if !self.has_deprecated() {
      output.push_str(&format!(
        "✅ - No deprecated or removed APIs found for Kubernetes {}\n",
        self.target_version
      ));
    }
    if self.has_unchecked() {
      output.push_str("⚠️ - Some API groups or resource types could not be checked, see the warnings above\n");
    }
    if self.partial {
      output.push_str("⚠️ - Results are partial, the run was cancelled before every resource type was listed\n");
    }

    Ok(output)
  }

  pub fn to_markdown(&self) -> Result<String> {
    let mut output = format!("# Kubernetes {}\n\n", self.target_version);

    output.push_str("## Deprecated APIs\n\n");
    output.push_str(&self.deprecated_apis.to_markdown_table("")?);
    output.push_str("\n\n## Deprecated and removed objects\n\n");
    output.push_str(&self.deprecated_objects.to_markdown_table("")?);
    output.push_str("\n\n## Warnings\n\n");
    output.push_str(&self.warnings.to_markdown_table("")?);
    output.push('\n');

    Ok(output)
  }
}

/// Merges the kind level and object level findings into one report
///
/// Each section keeps its own order; findings are not deduplicated across sections since a
/// kind being served and a kind being used are separate facts. Warnings raised by both the
/// listing and the walk (such as an undiscoverable group version) are kept once
pub fn assemble(
  target_version: &TargetVersion,
  deprecated_apis: Vec<DeprecatedApi>,
  walk: WalkResults,
  mut warnings: Vec<Warning>,
) -> Results {
  warnings.extend(walk.warnings);
  warnings.sort();
  warnings.dedup();

  Results {
    target_version: target_version.to_string(),
    deprecated_apis,
    deprecated_objects: walk.findings,
    warnings,
    partial: walk.partial,
  }
}

#[derive(Clone, Debug)]
pub struct AnalysisOptions {
  pub show_description: bool,
  pub api_walk: bool,
  pub walk: WalkOptions,
}

impl Default for AnalysisOptions {
  fn default() -> Self {
    Self {
      show_description: true,
      api_walk: true,
      walk: WalkOptions::default(),
    }
  }
}

/// Analyze the cluster against the index to collect all reported findings
///
/// The served API listing and the object walk run concurrently. When one of them fails
/// discovery while the other completes, the failure is reported as a warning
pub async fn analyze<K: K8sClients>(
  client: &K,
  index: &SpecIndex,
  target_version: &TargetVersion,
  options: &AnalysisOptions,
  cancel: &CancellationToken,
  mut warnings: Vec<Warning>,
) -> Result<Results> {
  let lister = k8s::get_deprecated_apis(client, index, options.show_description);
  let walker = async {
    if options.api_walk {
      Some(k8s::walk_objects(client, index, &options.walk, cancel).await)
    } else {
      info!("Object walk disabled");
      None
    }
  };
  let (listed, walked) = tokio::join!(lister, walker);

  let walk_completed = matches!(walked, Some(Ok(_)));
  let deprecated_apis = match listed {
    Ok(served) => {
      warnings.extend(served.warnings);
      served.findings
    }
    Err(err) if walk_completed => {
      warn!("{err}");
      warnings.push(Warning::discovery(&err));
      Vec::new()
    }
    Err(err) => return Err(err).context("Unable to list the APIs served by the cluster"),
  };

  let walk = match walked {
    Some(Ok(walk)) => walk,
    Some(Err(err)) => {
      warn!("{err}");
      warnings.push(Warning::discovery(&err));
      WalkResults::default()
    }
    None => WalkResults::default(),
  };

  Ok(assemble(target_version, deprecated_apis, walk, warnings))
}

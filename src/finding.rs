use anyhow::Result;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Tabled)]
#[tabled(rename_all = "UpperCase")]
pub struct Finding {
  #[tabled(rename = "CHECK")]
  pub code: Code,
  #[tabled(rename = " ")]
  pub symbol: String,
  #[tabled(skip)]
  pub remediation: Remediation,
}

impl Finding {
  pub fn new(code: Code, remediation: Remediation) -> Self {
    Self {
      code,
      symbol: remediation.symbol(),
      remediation,
    }
  }
}

/// Determines whether remediation is required or recommended
///
/// This allows for filtering of findings shown to user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Remediation {
  /// The API is not served by the target version; objects using it must be migrated
  /// before the cluster is upgraded
  Required,
  /// The API is still served but deprecated; migrating is encouraged but not a blocker
  Recommended,
}

impl Remediation {
  pub(crate) fn symbol(&self) -> String {
    match &self {
      Remediation::Required => "❌".to_string(),
      Remediation::Recommended => "⚠️".to_string(),
    }
  }
}

impl std::fmt::Display for Remediation {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match *self {
      Remediation::Required => write!(f, "Required"),
      Remediation::Recommended => write!(f, "Recommended"),
    }
  }
}

pub trait Findings {
  fn to_markdown_table(&self, leading_whitespace: &str) -> Result<String>;
  fn to_stdout_table(&self) -> Result<String>;
}

macro_rules! impl_findings {
  ($type:ty, $empty_msg:expr) => {
    impl Findings for Vec<$type> {
      fn to_markdown_table(&self, leading_whitespace: &str) -> ::anyhow::Result<String> {
        if self.is_empty() {
          return Ok(format!("{leading_whitespace}{}", $empty_msg));
        }

        let mut table = ::tabled::Table::new(self);
        table
          .with(::tabled::settings::Remove::column(::tabled::settings::location::ByColumnName::new("CHECK")))
          .with(::tabled::settings::Margin::new(1, 0, 0, 0).fill('\t', 'x', 'x', 'x'))
          .with(::tabled::settings::Style::markdown());

        Ok(format!("{table}\n"))
      }

      fn to_stdout_table(&self) -> ::anyhow::Result<String> {
        if self.is_empty() {
          return Ok(String::new());
        }

        let mut table = ::tabled::Table::new(self);
        table.with(::tabled::settings::Style::sharp());

        Ok(format!("{table}\n"))
      }
    }
  };
}

pub(crate) use impl_findings;

/// Codes that represent the finding variants
///
/// Codes give users a stable handle to filter on and to look up the reasoning behind
/// a finding, while keeping the direct output concise
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Code {
  /// Deprecated API kind is still served by the API server
  API001,

  /// Object stored with a deprecated API kind
  API002,

  /// Object stored with an API kind that does not exist in the target version
  API003,
}

impl std::fmt::Display for Code {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match *self {
      Code::API001 => write!(f, "API001"),
      Code::API002 => write!(f, "API002"),
      Code::API003 => write!(f, "API003"),
    }
  }
}

/// Category of a non-fatal problem reported alongside the findings
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WarningKind {
  /// The downloaded specification could not be cached locally
  CacheWrite,
  /// A group version could not be discovered, or discovery failed for one component
  /// while the other one completed
  Discovery,
  /// A resource type could not be listed (commonly forbidden or no longer served)
  ResourceList,
  /// The run was cancelled or timed out before all resource types were listed
  Cancelled,
}

impl std::fmt::Display for WarningKind {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match *self {
      WarningKind::CacheWrite => write!(f, "CacheWrite"),
      WarningKind::Discovery => write!(f, "Discovery"),
      WarningKind::ResourceList => write!(f, "ResourceList"),
      WarningKind::Cancelled => write!(f, "Cancelled"),
    }
  }
}

/// A non-fatal problem encountered during the run
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Tabled)]
#[tabled(rename_all = "UpperCase")]
pub struct Warning {
  pub kind: WarningKind,
  /// Resource path the warning applies to, empty when it applies to the whole run
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub resource: String,
  pub message: String,
}

impl Warning {
  pub fn cache_write(err: &Error) -> Self {
    Self {
      kind: WarningKind::CacheWrite,
      resource: String::new(),
      message: err.to_string(),
    }
  }

  pub fn discovery(err: &Error) -> Self {
    Self {
      kind: WarningKind::Discovery,
      resource: String::new(),
      message: err.to_string(),
    }
  }

  /// A group version left out of discovery; none of its resource types were checked
  pub fn group_discovery(group_version: &str, err: &Error) -> Self {
    Self {
      kind: WarningKind::Discovery,
      resource: group_version.to_owned(),
      message: err.to_string(),
    }
  }

  pub fn resource_list(resource: &str, err: &Error) -> Self {
    Self {
      kind: WarningKind::ResourceList,
      resource: resource.to_owned(),
      message: err.to_string(),
    }
  }

  pub fn cancelled(skipped: usize) -> Self {
    Self {
      kind: WarningKind::Cancelled,
      resource: String::new(),
      message: format!("Run cancelled before completion, {skipped} resource type(s) were not listed"),
    }
  }
}

impl_findings!(Warning, "✅ - No warnings reported");

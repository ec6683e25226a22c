use std::{fs::File, io::prelude::*};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::analysis;

/// Renders optional values for tabled output, `-` when absent
pub fn tabled_option_to_string(value: &Option<String>) -> String {
  match value {
    Some(value) => value.to_owned(),
    None => "-".to_owned(),
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum Format {
  /// JSON format used for logging or writing to a *.json file
  Json,
  /// Markdown tables, suited for pull request comments or issues
  Markdown,
  /// Text format used for writing to stdout
  #[default]
  Text,
}

pub fn render(results: &analysis::Results, format: Format) -> Result<String> {
  let rendered = match format {
    Format::Json => serde_json::to_string_pretty(results)?,
    Format::Markdown => results.to_markdown()?,
    Format::Text => results.to_stdout_table()?,
  };

  Ok(rendered)
}

pub fn output(results: &analysis::Results, format: Format, filename: Option<&str>) -> Result<()> {
  let output = render(results, format)?;

  match filename {
    Some(filename) => {
      let mut file = File::create(filename).with_context(|| format!("Unable to create output file {filename}"))?;
      file.write_all(output.as_bytes())?;
    }
    None => {
      println!("{output}");
    }
  }

  Ok(())
}

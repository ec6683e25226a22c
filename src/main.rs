use std::{process, time::Duration};

use anyhow::Result;
use clap::Parser;
use deprecheck::Cli;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_log::AsTrace;

/// Exit status when the cluster uses APIs that must be migrated before upgrading
const FINDINGS_EXIT_CODE: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let subscriber = tracing_subscriber::fmt()
    .with_max_level(cli.verbose.log_level_filter().as_trace())
    .with_writer(std::io::stderr)
    .finish();
  tracing::subscriber::set_global_default(subscriber)?;

  let cancel = CancellationToken::new();
  tokio::spawn(cancel_on_interrupt_or_timeout(
    cancel.clone(),
    cli.timeout.map(Duration::from_secs),
  ));

  let results = deprecheck::analyze(&cli, &cancel).await?;

  if results.has_removed() || (cli.error_on_deprecated && results.has_deprecated()) {
    process::exit(FINDINGS_EXIT_CODE);
  }

  Ok(())
}

/// Cancels the run on Ctrl-C or once the timeout elapses; a second Ctrl-C exits immediately
async fn cancel_on_interrupt_or_timeout(cancel: CancellationToken, timeout: Option<Duration>) {
  let deadline = async {
    match timeout {
      Some(timeout) => tokio::time::sleep(timeout).await,
      None => std::future::pending().await,
    }
  };

  tokio::select! {
    _ = tokio::signal::ctrl_c() => warn!("Interrupted, waiting for in-flight requests to finish"),
    _ = deadline => warn!("Timed out, waiting for in-flight requests to finish"),
  }
  cancel.cancel();

  if tokio::signal::ctrl_c().await.is_ok() {
    process::exit(130);
  }
}

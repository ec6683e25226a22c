use std::{future::Future, time::Duration};

use futures::{StreamExt, future, stream};
use tokio::{
  sync::Mutex,
  time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

/// Default number of cluster calls allowed in flight at once
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Limits applied when fanning work out against the API server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolOptions {
  /// Maximum number of items processed concurrently
  pub concurrency: usize,
  /// Minimum delay between two items being started, zero to disable pacing
  pub min_interval: Duration,
}

impl Default for PoolOptions {
  fn default() -> Self {
    Self {
      concurrency: DEFAULT_CONCURRENCY,
      min_interval: Duration::ZERO,
    }
  }
}

#[derive(Debug)]
pub struct Completed<T> {
  /// One output per processed item, in completion order
  pub outputs: Vec<T>,
  /// Items never started because the run was cancelled
  pub skipped: usize,
}

/// Runs `f` over every item with at most `options.concurrency` in flight
///
/// Once `cancel` fires no further items are started, including ones already queued behind
/// the pacer; the ones already started run to completion and their outputs are kept
pub async fn run_bounded<I, T, F, Fut>(
  items: Vec<I>,
  options: &PoolOptions,
  cancel: &CancellationToken,
  f: F,
) -> Completed<T>
where
  F: Fn(I) -> Fut,
  Fut: Future<Output = T>,
{
  let total = items.len();

  let pacer = (!options.min_interval.is_zero()).then(|| {
    let mut interval = time::interval(options.min_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Mutex::new(interval)
  });
  let pacer = pacer.as_ref();
  let f = &f;

  let outputs: Vec<T> = stream::iter(items)
    .take_while(|_| future::ready(!cancel.is_cancelled()))
    .map(|item| async move {
      if let Some(pacer) = pacer {
        tokio::select! {
          _ = cancel.cancelled() => return None,
          _ = async { pacer.lock().await.tick().await } => {}
        }
      }
      if cancel.is_cancelled() {
        return None;
      }
      Some(f(item).await)
    })
    .buffer_unordered(options.concurrency.max(1))
    .filter_map(future::ready)
    .collect()
    .await;

  let skipped = total - outputs.len();
  Completed { outputs, skipped }
}

//! The progress monitor: periodic, advisory reporting over the registry.
//!
//! Runs as its own task alongside the workers. Every poll tick it reads the
//! registry size and emits progress; it terminates when the registry
//! reaches the expected count or when the orchestrator signals that all
//! workers have finished. The second condition matters: with failed pages
//! the registry never reaches the expected count, and the orchestrator
//! waits on the monitor alongside the workers.

use crate::progress::ProgressCallback;
use crate::registry::CompletionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Poll the registry every `interval` until the run is complete.
///
/// `workers_done` flips to `true` once every worker has been joined.
pub async fn run(
    registry: Arc<CompletionRegistry>,
    expected: usize,
    interval: Duration,
    mut workers_done: watch::Receiver<bool>,
    progress: Option<ProgressCallback>,
) {
    loop {
        let completed = registry.len();
        if completed >= expected {
            info!("All {completed} pages downloaded");
            if let Some(cb) = &progress {
                cb.on_progress(completed, expected);
            }
            break;
        }

        info!("Downloaded {completed} of {expected} pages");
        if let Some(cb) = &progress {
            cb.on_progress(completed, expected);
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = workers_done.changed() => {
                if changed.is_err() || *workers_done.borrow() {
                    let completed = registry.len();
                    info!("Workers finished with {completed} of {expected} pages");
                    if let Some(cb) = &progress {
                        cb.on_progress(completed, expected);
                    }
                    break;
                }
            }
        }
    }
}

//! The download run: authenticate, discover, fetch concurrently, assemble.
//!
//! A run moves through a fixed sequence of phases:
//!
//! ```text
//! Idle → Authenticating → Discovering → Fetching → Assembling → Done
//!                    (any fatal error → Failed)
//! ```
//!
//! `Fetching` spawns one worker task per page plus the progress monitor and
//! waits for all of them; individual worker failures never leave the
//! `Fetching` phase. The scratch area is dropped on every exit path, so
//! transient storage is removed whether the run ends in `Done` or `Failed`.

use crate::config::DownloadConfig;
use crate::discover;
use crate::error::Book2PdfError;
use crate::output::{DownloadOutput, DownloadStats};
use crate::pipeline::{assemble, fetch::PageFetcher, monitor, worker};
use crate::registry::CompletionRegistry;
use crate::scratch::Scratch;
use crate::session::Session;
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tracing::{error, info, warn};

/// Phase of a download run, used for logging and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Authenticating,
    Discovering,
    Fetching,
    Assembling,
    Done,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::Authenticating => "authenticating",
            RunPhase::Discovering => "discovering",
            RunPhase::Fetching => "fetching",
            RunPhase::Assembling => "assembling",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Download the book behind `book_url` and bind it into one PDF.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(DownloadOutput)` on success, even if some pages failed — the visible
/// failure for a bad page is a thinner book (check
/// `output.stats.failed_pages`, or use [`DownloadOutput::into_result`]).
///
/// # Errors
/// Returns `Err(Book2PdfError)` only for fatal errors: authentication
/// rejected, book metadata unparsable, nothing downloaded at all, or
/// assembly/output failure.
pub async fn download(
    book_url: impl AsRef<str>,
    config: &DownloadConfig,
) -> Result<DownloadOutput, Book2PdfError> {
    let book_url = book_url.as_ref();
    let started = Instant::now();

    let result = run(book_url, config, started).await;
    match &result {
        Ok(output) => info!(
            phase = %RunPhase::Done,
            "Downloaded {}/{} pages in {}ms",
            output.stats.completed_pages, output.stats.expected_pages, output.stats.duration_ms
        ),
        Err(e) => error!(phase = %RunPhase::Failed, "Run failed: {e}"),
    }
    result
}

async fn run(
    book_url: &str,
    config: &DownloadConfig,
    started: Instant,
) -> Result<DownloadOutput, Book2PdfError> {
    info!(phase = %RunPhase::Authenticating, "Starting download: {book_url}");
    let session = Arc::new(Session::login(config).await?);

    info!(phase = %RunPhase::Discovering, "Resolving book metadata");
    let book = discover::book_info(&session, book_url).await?;

    let last_page = config.last_page(book.total_pages);
    if last_page == 0 {
        return Err(Book2PdfError::EmptyBook {
            total_pages: book.total_pages,
        });
    }
    let expected = config.expected_pages(book.total_pages);

    if let Some(cb) = &config.progress {
        cb.on_run_start(expected);
    }

    // Scratch is dropped on every path out of this function, which removes
    // the whole area; removal errors are discarded by the drop impl.
    let scratch = Arc::new(
        Scratch::new(config.scratch_root.as_deref())
            .map_err(|e| Book2PdfError::Internal(format!("scratch area: {e}")))?,
    );
    let registry = Arc::new(CompletionRegistry::new());

    info!(
        phase = %RunPhase::Fetching,
        "Fetching {expected} pages with {} concurrent fetches",
        config.concurrency
    );
    let ctx = Arc::new(worker::WorkerContext {
        fetcher: PageFetcher::new(Arc::clone(&session), book.code.clone()),
        scratch: Arc::clone(&scratch),
        registry: Arc::clone(&registry),
        gate: Arc::new(Semaphore::new(config.concurrency)),
        progress: config.progress.clone(),
    });

    let (done_tx, done_rx) = watch::channel(false);
    let monitor = tokio::spawn(monitor::run(
        Arc::clone(&registry),
        expected,
        Duration::from_secs(config.progress_interval_secs),
        done_rx,
        config.progress.clone(),
    ));

    let workers: Vec<_> = config
        .page_range(book.total_pages)
        .map(|page| tokio::spawn(worker::run_page(Arc::clone(&ctx), page)))
        .collect();
    for join in join_all(workers).await {
        if let Err(e) = join {
            // Workers contain their own errors; a JoinError is a panic.
            warn!("Worker task aborted: {e}");
        }
    }

    let _ = done_tx.send(true);
    if let Err(e) = monitor.await {
        warn!("Monitor task aborted: {e}");
    }

    let completed = registry.snapshot();
    if let Some(cb) = &config.progress {
        cb.on_run_complete(completed.len(), expected);
    }
    if completed.is_empty() {
        return Err(Book2PdfError::NoPagesDownloaded { expected });
    }

    info!(phase = %RunPhase::Assembling, "Binding {} pages", completed.len());
    let output_path = {
        let scratch = Arc::clone(&scratch);
        let pages = completed.clone();
        let title = book.title.clone();
        let output_dir = config.output_dir.clone();
        tokio::task::spawn_blocking(move || {
            assemble::bind_pages(&scratch, &pages, &title, &output_dir)
        })
        .await
        .map_err(|e| Book2PdfError::Internal(format!("assembly task panicked: {e}")))??
    };

    let stats = DownloadStats {
        total_pages: book.total_pages,
        expected_pages: expected,
        completed_pages: completed.len(),
        failed_pages: expected.saturating_sub(completed.len()),
        duration_ms: started.elapsed().as_millis() as u64,
    };

    Ok(DownloadOutput {
        output_path,
        book,
        pages: completed,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_display_names() {
        assert_eq!(RunPhase::Authenticating.to_string(), "authenticating");
        assert_eq!(RunPhase::Done.to_string(), "done");
        assert_eq!(RunPhase::Failed.to_string(), "failed");
    }
}

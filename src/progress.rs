//! Progress-callback trait for download events.
//!
//! Inject an [`Arc<dyn DownloadProgressCallback>`] via
//! [`crate::config::DownloadConfigBuilder::progress`] to receive real-time
//! events as workers finish pages and the monitor polls the completion
//! registry.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a WebSocket, or a terminal progress bar
//! without the library knowing anything about how the host application
//! communicates. The trait is `Send + Sync` because pages complete
//! concurrently from separate tasks.

use std::sync::Arc;

/// Called by the download pipeline as pages complete and as the monitor
/// polls.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// `on_page_complete` and `on_page_error` may be called concurrently from
/// different tasks; `on_progress` comes from the monitor task.
/// Implementations must protect shared mutable state with appropriate
/// synchronisation primitives (e.g. `Mutex`, `AtomicUsize`).
pub trait DownloadProgressCallback: Send + Sync {
    /// Called once, after discovery, before any page is fetched.
    ///
    /// # Arguments
    /// * `expected_pages` — number of pages the run will attempt
    fn on_run_start(&self, expected_pages: usize) {
        let _ = expected_pages;
    }

    /// Called when a page has been fetched, converted, and registered.
    fn on_page_complete(&self, page: u32) {
        let _ = page;
    }

    /// Called when a page is dropped after a fetch or conversion failure.
    fn on_page_error(&self, page: u32, error: &str) {
        let _ = (page, error);
    }

    /// Called by the monitor on every poll tick.
    ///
    /// # Arguments
    /// * `completed` — registry size at the time of the poll
    /// * `expected`  — pages a fully successful run registers
    fn on_progress(&self, completed: usize, expected: usize) {
        let _ = (completed, expected);
    }

    /// Called once after workers and monitor have finished, before assembly.
    fn on_run_complete(&self, completed: usize, expected: usize) {
        let _ = (completed, expected);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl DownloadProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::DownloadConfig`].
pub type ProgressCallback = Arc<dyn DownloadProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        completes: AtomicUsize,
        errors: AtomicUsize,
        polls: AtomicUsize,
        final_count: AtomicUsize,
    }

    impl DownloadProgressCallback for TrackingCallback {
        fn on_page_complete(&self, _page: u32) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page: u32, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_progress(&self, _completed: usize, _expected: usize) {
            self.polls.fetch_add(1, Ordering::SeqCst);
        }

        fn on_run_complete(&self, completed: usize, _expected: usize) {
            self.final_count.store(completed, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(4);
        cb.on_page_complete(1);
        cb.on_page_error(2, "fetch failed");
        cb.on_progress(1, 4);
        cb.on_run_complete(3, 4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            final_count: AtomicUsize::new(0),
        };

        tracker.on_run_start(3);
        tracker.on_page_complete(1);
        tracker.on_page_complete(3);
        tracker.on_page_error(2, "HTTP 500");
        tracker.on_progress(2, 3);
        tracker.on_run_complete(2, 3);

        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.polls.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.final_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn DownloadProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_run_start(10);
        cb.on_page_complete(1);
    }
}

//! Error types for the book2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Book2PdfError`] — **Fatal**: the download cannot proceed at all
//!   (bad credentials, unparsable book page, broken assembly). Returned as
//!   `Err(Book2PdfError)` from [`crate::download::download`].
//!
//! * [`PageError`] — **Non-fatal**: a single page failed (fetch glitch,
//!   malformed markup) but all other pages are fine. Caught at the worker
//!   boundary and logged; the page is simply absent from the output.
//!
//! The separation keeps the blast radius of a bad page at exactly one page:
//! a run only aborts for errors that make the whole book unreachable or the
//! final document unwritable.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the book2pdf library.
///
/// Page-level failures use [`PageError`] and never cross the worker
/// boundary.
#[derive(Debug, Error)]
pub enum Book2PdfError {
    // ── Authentication errors ─────────────────────────────────────────────
    /// The service does not know the account.
    #[error("No account registered for '{email}'\nCheck the address in your account file.")]
    UnknownAccount { email: String },

    /// The account exists but the password was rejected.
    #[error("Wrong password for account '{email}'")]
    WrongPassword { email: String },

    /// The login request itself failed (network, timeout, non-success status).
    #[error("Login request failed: {detail}")]
    LoginFailed { detail: String },

    // ── Discovery errors ──────────────────────────────────────────────────
    /// The supplied URL does not look like a book landing page.
    #[error("'{url}' is not a book URL (expected …/book/…)")]
    InvalidBookUrl { url: String },

    /// A metadata request (landing or viewer page) failed outright.
    #[error("Failed to load '{url}': {reason}")]
    MetadataRequestFailed { url: String, reason: String },

    /// The landing page carries no page-count marker.
    #[error("Page count not found on '{url}'\nThe page layout may have changed, or the URL is not supported.")]
    PageCountNotFound { url: String },

    /// The landing page carries no title heading.
    #[error("Book title not found on '{url}'")]
    TitleNotFound { url: String },

    /// The viewer page carries no viewer code.
    #[error("Viewer code not found on '{url}'\nThe book may not be readable with this account.")]
    ViewerCodeNotFound { url: String },

    /// The reported page count leaves nothing to fetch.
    #[error("Book reports {total_pages} pages — nothing to download")]
    EmptyBook { total_pages: u32 },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// A registered page has no artifact on disk. Should not happen given
    /// the worker contract, but is detected rather than silently skipped.
    #[error("Page {page} is registered as downloaded but its artifact '{path}' is missing")]
    MissingArtifact { page: u32, path: PathBuf },

    /// Merging the page artifacts into one document failed.
    #[error("Failed to bind pages into one PDF: {detail}")]
    MergeFailed { detail: String },

    /// Could not write the bound output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Run outcome errors ────────────────────────────────────────────────
    /// Every page failed; there is nothing to bind.
    #[error("None of the {expected} pages could be downloaded")]
    NoPagesDownloaded { expected: usize },

    /// Some pages succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::DownloadOutput::into_result`] when the
    /// caller wants to treat any missing page as an error.
    #[error("{failed}/{expected} pages failed to download")]
    PartialDownload {
        completed: usize,
        failed: usize,
        expected: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Logged at the worker boundary; the run continues and the page is absent
/// from the final document.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page fetch failed: network error, timeout, or a non-success
    /// response status.
    #[error("Page {page}: fetch failed: {detail}")]
    Transport { page: u32, detail: String },

    /// The fetched markup could not be rendered into a page PDF.
    #[error("Page {page}: conversion failed: {detail}")]
    Conversion { page: u32, detail: String },
}

impl PageError {
    /// The page number this error belongs to.
    pub fn page(&self) -> u32 {
        match self {
            PageError::Transport { page, .. } | PageError::Conversion { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_download_display() {
        let e = Book2PdfError::PartialDownload {
            completed: 9,
            failed: 1,
            expected: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("1/10"), "got: {msg}");
    }

    #[test]
    fn unknown_account_display() {
        let e = Book2PdfError::UnknownAccount {
            email: "reader@example.com".into(),
        };
        assert!(e.to_string().contains("reader@example.com"));
    }

    #[test]
    fn missing_artifact_display() {
        let e = Book2PdfError::MissingArtifact {
            page: 7,
            path: PathBuf::from("/tmp/scratch/7.pdf"),
        };
        assert!(e.to_string().contains("Page 7"));
        assert!(e.to_string().contains("7.pdf"));
    }

    #[test]
    fn page_error_page_number() {
        let t = PageError::Transport {
            page: 3,
            detail: "HTTP 503".into(),
        };
        let c = PageError::Conversion {
            page: 4,
            detail: "bad markup".into(),
        };
        assert_eq!(t.page(), 3);
        assert_eq!(c.page(), 4);
    }
}

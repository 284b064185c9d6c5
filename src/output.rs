//! Result types returned by [`crate::download::download`].

use crate::error::Book2PdfError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Book metadata resolved by discovery. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookInfo {
    /// Viewer code identifying the book on the page endpoint.
    pub code: String,
    /// Title as shown on the landing page; names the output file.
    pub title: String,
    /// Page count as reported by the landing page (see
    /// [`crate::config::DownloadConfig::trailing_margin`] for how many of
    /// these are actually fetched).
    pub total_pages: u32,
}

/// Aggregate counters for one download run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadStats {
    /// Page count reported by the landing page.
    pub total_pages: u32,
    /// Pages the run attempted (`total_pages` minus the trailing margin).
    pub expected_pages: usize,
    /// Pages fetched, converted, and bound into the output.
    pub completed_pages: usize,
    /// Pages dropped after a fetch or conversion failure.
    pub failed_pages: usize,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
}

/// The outcome of a successful (possibly partial) download run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOutput {
    /// Where the bound PDF was written.
    pub output_path: PathBuf,
    /// Discovered book metadata.
    pub book: BookInfo,
    /// Ascending page numbers present in the output.
    pub pages: Vec<u32>,
    pub stats: DownloadStats,
}

impl DownloadOutput {
    /// Whether every expected page made it into the output.
    pub fn is_complete(&self) -> bool {
        self.stats.failed_pages == 0
    }

    /// Treat a partial download as an error.
    ///
    /// The pipeline itself considers a run with missing pages successful
    /// (the visible failure is a thinner book, not a crash); callers that
    /// need every page can tighten that here.
    pub fn into_result(self) -> Result<DownloadOutput, Book2PdfError> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(Book2PdfError::PartialDownload {
                completed: self.stats.completed_pages,
                failed: self.stats.failed_pages,
                expected: self.stats.expected_pages,
            })
        }
    }
}

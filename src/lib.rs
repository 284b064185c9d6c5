//! # book2pdf
//!
//! Download paginated books from an SVG page viewer and bind them into a
//! single PDF.
//!
//! ## Why this crate?
//!
//! Some reading platforms serve books only through a page-at-a-time web
//! viewer: each page is an individual SVG document behind an authenticated
//! session, and nothing offers the book as one file. This crate logs in,
//! discovers the page count and viewer code from the book's pages, fetches
//! every page concurrently, renders each one to a single-page PDF, and
//! binds the results into one ordered document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! book URL
//!  │
//!  ├─ 1. Login     authenticate once; cookie session shared by all fetches
//!  ├─ 2. Discover  scrape page count, title, and viewer code
//!  ├─ 3. Fetch     one worker per page, gated to 4 concurrent requests
//!  ├─ 4. Convert   SVG → single-page PDF (CPU-bound, spawn_blocking)
//!  ├─ 5. Monitor   periodic progress over the completion registry
//!  └─ 6. Bind      merge artifacts in page order → "{title}.pdf"
//! ```
//!
//! A failed page is logged and dropped; the run continues and the output is
//! simply missing that page. Only authentication, discovery, and assembly
//! failures abort a run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use book2pdf::{download, Credentials, DownloadConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DownloadConfig::builder(Credentials::new("reader@example.com", "secret"))
//!         .output_dir("downloads")
//!         .build()?;
//!     let output = download("https://urait.ru/book/some-book-123456", &config).await?;
//!     println!("{}", output.output_path.display());
//!     eprintln!("pages: {}/{}",
//!         output.stats.completed_pages,
//!         output.stats.expected_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `book2pdf` binary (clap + indicatif + notify-rust) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! book2pdf = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod discover;
pub mod download;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod scratch;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Credentials, DownloadConfig, DownloadConfigBuilder};
pub use download::{download, RunPhase};
pub use error::{Book2PdfError, PageError};
pub use output::{BookInfo, DownloadOutput, DownloadStats};
pub use progress::{DownloadProgressCallback, NoopProgressCallback, ProgressCallback};
pub use registry::CompletionRegistry;
pub use scratch::Scratch;
pub use session::Session;

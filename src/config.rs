//! Configuration types for a book download.
//!
//! All download behaviour is controlled through [`DownloadConfig`], built via
//! its [`DownloadConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across tasks, log them, and diff two runs to
//! understand why their outputs differ.
//!
//! Credentials and the service base URL are explicit fields rather than
//! process-wide globals, so tests can point a config at a mock server and
//! two downloads with different accounts can coexist in one process.

use crate::error::Book2PdfError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// The User-Agent the original client presents; some viewers refuse
/// requests without a browser-looking one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 YaBrowser/24.7.0.0 Safari/537.36";

/// Account credentials for the remote service.
///
/// Sourced from the account env-file or CLI flags and passed in explicitly;
/// the library never reads process environment on its own.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for a book download.
///
/// Built via [`DownloadConfig::builder()`].
///
/// # Example
/// ```rust
/// use book2pdf::{Credentials, DownloadConfig};
///
/// let config = DownloadConfig::builder(Credentials::new("reader@example.com", "secret"))
///     .concurrency(4)
///     .output_dir("downloads")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct DownloadConfig {
    /// Account used for the login call.
    pub credentials: Credentials,

    /// Service base URL. Default: `https://urait.ru`.
    ///
    /// Everything except the user-supplied book URL is derived from this:
    /// the login endpoint and the per-page viewer endpoint.
    pub base_url: String,

    /// Capacity of the fetch gate — the number of page fetches allowed in
    /// flight at once. Default: 4.
    ///
    /// The gate bounds network requests only; conversion runs unconstrained.
    /// Raising this mostly trades politeness to the service for wall-clock
    /// time.
    pub concurrency: usize,

    /// Number of trailing page numbers the viewer reports but never serves.
    /// Default: 1.
    ///
    /// The viewer's reported count includes one entry past the last
    /// fetchable page, so a book reporting N pages yields pages
    /// `1..=N - trailing_margin`. The same boundary drives the worker
    /// range, the completion condition, and the progress denominator.
    pub trailing_margin: u32,

    /// Seconds between progress emissions from the monitor. Default: 2.
    pub progress_interval_secs: u64,

    /// Per-request timeout in seconds, applied to login, discovery, and
    /// page fetches alike. Default: 30.
    ///
    /// Without it a single stalled fetch would pin one gate slot for the
    /// rest of the run.
    pub fetch_timeout_secs: u64,

    /// Directory the bound PDF is written to. Default: current directory.
    pub output_dir: PathBuf,

    /// Parent directory for the per-run scratch area. Default: the system
    /// temp directory.
    pub scratch_root: Option<PathBuf>,

    /// User-Agent presented on every request. Default: [`DEFAULT_USER_AGENT`].
    pub user_agent: String,

    /// Progress callback receiving per-page and periodic events.
    pub progress: Option<ProgressCallback>,
}

impl fmt::Debug for DownloadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadConfig")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("concurrency", &self.concurrency)
            .field("trailing_margin", &self.trailing_margin)
            .field("progress_interval_secs", &self.progress_interval_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("output_dir", &self.output_dir)
            .field("scratch_root", &self.scratch_root)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn callback>"))
            .finish()
    }
}

impl DownloadConfig {
    /// Create a new builder seeded with the given credentials.
    pub fn builder(credentials: Credentials) -> DownloadConfigBuilder {
        DownloadConfigBuilder {
            config: DownloadConfig {
                credentials,
                base_url: "https://urait.ru".to_string(),
                concurrency: 4,
                trailing_margin: 1,
                progress_interval_secs: 2,
                fetch_timeout_secs: 30,
                output_dir: PathBuf::from("."),
                scratch_root: None,
                user_agent: DEFAULT_USER_AGENT.to_string(),
                progress: None,
            },
        }
    }

    /// Highest page number to fetch for a book reporting `total_pages`.
    pub fn last_page(&self, total_pages: u32) -> u32 {
        total_pages.saturating_sub(self.trailing_margin)
    }

    /// The inclusive page-number range covered by workers.
    pub fn page_range(&self, total_pages: u32) -> RangeInclusive<u32> {
        1..=self.last_page(total_pages)
    }

    /// Number of pages a fully successful run registers.
    pub fn expected_pages(&self, total_pages: u32) -> usize {
        self.last_page(total_pages) as usize
    }
}

/// Builder for [`DownloadConfig`].
#[derive(Debug)]
pub struct DownloadConfigBuilder {
    config: DownloadConfig,
}

impl DownloadConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn trailing_margin(mut self, pages: u32) -> Self {
        self.config.trailing_margin = pages;
        self
    }

    pub fn progress_interval_secs(mut self, secs: u64) -> Self {
        self.config.progress_interval_secs = secs.max(1);
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn scratch_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_root = Some(dir.into());
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn progress(mut self, callback: ProgressCallback) -> Self {
        self.config.progress = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DownloadConfig, Book2PdfError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(Book2PdfError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.credentials.email.trim().is_empty() || c.credentials.password.is_empty() {
            return Err(Book2PdfError::InvalidConfig(
                "Both account email and password are required".into(),
            ));
        }
        if !c.base_url.starts_with("http://") && !c.base_url.starts_with("https://") {
            return Err(Book2PdfError::InvalidConfig(format!(
                "Base URL must be http(s), got '{}'",
                c.base_url
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new("reader@example.com", "secret")
    }

    #[test]
    fn defaults() {
        let config = DownloadConfig::builder(creds()).build().unwrap();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.trailing_margin, 1);
        assert_eq!(config.progress_interval_secs, 2);
        assert_eq!(config.base_url, "https://urait.ru");
    }

    #[test]
    fn page_boundary_is_consistent() {
        let config = DownloadConfig::builder(creds()).build().unwrap();
        assert_eq!(config.last_page(5), 4);
        assert_eq!(config.page_range(5), 1..=4);
        assert_eq!(config.expected_pages(5), 4);
    }

    #[test]
    fn page_boundary_respects_margin() {
        let config = DownloadConfig::builder(creds())
            .trailing_margin(2)
            .build()
            .unwrap();
        assert_eq!(config.last_page(10), 8);
        assert_eq!(config.expected_pages(10), 8);
    }

    #[test]
    fn page_boundary_saturates() {
        let config = DownloadConfig::builder(creds()).build().unwrap();
        assert_eq!(config.last_page(0), 0);
        assert!(config.page_range(0).is_empty());
    }

    #[test]
    fn rejects_empty_credentials() {
        let result = DownloadConfig::builder(Credentials::new("", "secret")).build();
        assert!(matches!(result, Err(Book2PdfError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_bad_base_url() {
        let result = DownloadConfig::builder(creds()).base_url("ftp://nope").build();
        assert!(matches!(result, Err(Book2PdfError::InvalidConfig(_))));
    }

    #[test]
    fn debug_redacts_password() {
        let text = format!("{:?}", creds());
        assert!(!text.contains("secret"));
        assert!(text.contains("redacted"));
    }
}

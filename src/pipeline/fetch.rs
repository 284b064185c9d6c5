//! Page fetching: retrieve one page's SVG markup over the session.
//!
//! The viewer serves each page as a standalone SVG document at
//! `{base}/viewer/page/{code}/{page}`. Anything other than a success
//! status is a transport error for that page; there are no retries at
//! this layer — failure is reported upward and the worker drops the page.

use crate::error::PageError;
use crate::session::Session;
use std::sync::Arc;
use tracing::debug;

/// Fetches raw page markup for one book over the shared session.
pub struct PageFetcher {
    session: Arc<Session>,
    code: String,
}

impl PageFetcher {
    pub fn new(session: Arc<Session>, code: impl Into<String>) -> Self {
        Self {
            session,
            code: code.into(),
        }
    }

    /// URL of the page endpoint for `page`.
    pub fn page_url(&self, page: u32) -> String {
        format!("{}/viewer/page/{}/{}", self.session.base_url(), self.code, page)
    }

    /// Retrieve the SVG markup for `page`.
    ///
    /// Requires the session to be authenticated; an expired session shows
    /// up here as a non-success status.
    pub async fn fetch(&self, page: u32) -> Result<String, PageError> {
        let url = self.page_url(page);
        let response = self
            .session
            .get(&url)
            .await
            .map_err(|e| PageError::Transport {
                page,
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageError::Transport {
                page,
                detail: format!("HTTP {status}"),
            });
        }

        let body = response.text().await.map_err(|e| PageError::Transport {
            page,
            detail: e.to_string(),
        })?;
        debug!("Fetched page {page} ({} bytes)", body.len());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, DownloadConfig};
    use crate::session::Session;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn fetcher_for(server: &MockServer) -> PageFetcher {
        let config = DownloadConfig::builder(Credentials::new("reader@example.com", "secret"))
            .base_url(server.uri())
            .build()
            .unwrap();
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
        let session = Arc::new(Session::login(&config).await.unwrap());
        PageFetcher::new(session, "CODE")
    }

    #[tokio::test]
    async fn success_returns_body() {
        let server = MockServer::start().await;
        let fetcher = fetcher_for(&server).await;
        Mock::given(method("GET"))
            .and(path("/viewer/page/CODE/3"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<svg/>"))
            .mount(&server)
            .await;

        let body = fetcher.fetch(3).await.unwrap();
        assert_eq!(body, "<svg/>");
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        let fetcher = fetcher_for(&server).await;
        Mock::given(method("GET"))
            .and(path("/viewer/page/CODE/4"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher.fetch(4).await.unwrap_err();
        match err {
            PageError::Transport { page, detail } => {
                assert_eq!(page, 4);
                assert!(detail.contains("404"), "got: {detail}");
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn page_url_shape() {
        let server = MockServer::start().await;
        let fetcher = fetcher_for(&server).await;
        assert_eq!(
            fetcher.page_url(12),
            format!("{}/viewer/page/CODE/12", server.uri().trim_end_matches('/'))
        );
    }
}

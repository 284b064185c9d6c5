//! The authenticated channel shared by every request in a run.
//!
//! One `reqwest::Client` with a cookie store carries the login session; it
//! is safe to share across all worker tasks, so a single login up front
//! covers every page fetch. The service signals login failure inside a
//! 200 response body, so [`Session::login`] scans the returned HTML for the
//! service's failure markers instead of trusting the status code.

use crate::config::DownloadConfig;
use crate::error::Book2PdfError;
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Body marker the service returns when the account does not exist.
const MARKER_UNKNOWN_ACCOUNT: &str = "Пользователь с указанным логином не зарегистрирован";
/// Body marker the service returns when the password is wrong.
const MARKER_WRONG_PASSWORD: &str = "Неверный пароль";

/// An authenticated session against the book service.
///
/// Created by [`Session::login`]; shared read-only across all workers.
#[derive(Debug)]
pub struct Session {
    client: reqwest::Client,
    base_url: String,
}

impl Session {
    /// Authenticate against `{base}/login` and return a session whose
    /// cookie store carries the credentials for all subsequent requests.
    ///
    /// Invalid-account and wrong-password responses are fatal; no fetching
    /// starts without a valid session.
    pub async fn login(config: &DownloadConfig) -> Result<Session, Book2PdfError> {
        let session = Session::build(config)?;
        let email = &config.credentials.email;

        info!("Logging in as {email}");
        let login_url = format!("{}/login", session.base_url);
        let response = session
            .client
            .post(&login_url)
            .json(&json!({
                "email": email,
                "password": config.credentials.password,
            }))
            .send()
            .await
            .map_err(|e| Book2PdfError::LoginFailed {
                detail: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Book2PdfError::LoginFailed {
                detail: e.to_string(),
            })?;

        if body.contains(MARKER_UNKNOWN_ACCOUNT) {
            return Err(Book2PdfError::UnknownAccount {
                email: email.clone(),
            });
        }
        if body.contains(MARKER_WRONG_PASSWORD) {
            return Err(Book2PdfError::WrongPassword {
                email: email.clone(),
            });
        }
        if !status.is_success() {
            return Err(Book2PdfError::LoginFailed {
                detail: format!("HTTP {status}"),
            });
        }

        info!("Login succeeded");
        Ok(session)
    }

    /// Build the unauthenticated client: cookie store, browser User-Agent,
    /// Origin header, and the per-request timeout.
    fn build(config: &DownloadConfig) -> Result<Session, Book2PdfError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        let origin = HeaderValue::from_str(&base_url).map_err(|e| {
            Book2PdfError::InvalidConfig(format!("Base URL is not a valid Origin: {e}"))
        })?;
        headers.insert(ORIGIN, origin);

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| Book2PdfError::Internal(format!("HTTP client: {e}")))?;

        debug!("Session client built for {base_url}");
        Ok(Session { client, base_url })
    }

    /// Issue a GET through the authenticated client.
    pub async fn get(&self, url: &str) -> reqwest::Result<reqwest::Response> {
        self.client.get(url).send().await
    }

    /// Service base URL with no trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

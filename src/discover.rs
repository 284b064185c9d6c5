//! Discovery collaborator: resolve book metadata from the landing and
//! viewer pages.
//!
//! The service exposes no metadata API, so the page count and title are
//! scraped from the landing page markup and the viewer code from the inline
//! `new Viewer('…')` call on the viewer page. All three markers are
//! mandatory; a missing one means the URL is unsupported or the layout
//! changed, and the run aborts before any fetching begins.

use crate::error::Book2PdfError;
use crate::output::BookInfo;
use crate::session::Session;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

static PAGE_COUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<span class="book-about-produce__info">(\d+)</span>"#)
        .expect("page-count regex is valid")
});

static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<h1 class="page-content-head__title book_title">(.+?)</h1>"#)
        .expect("title regex is valid")
});

static VIEWER_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"new Viewer\('([^']+)'").expect("viewer-code regex is valid"));

/// Resolve `{ total_pages, code, title }` for the book behind `book_url`.
///
/// Fetches the landing page for the page count and title, then the viewer
/// page (`/book/` → `/viewer/`) for the viewer code.
pub async fn book_info(session: &Session, book_url: &str) -> Result<BookInfo, Book2PdfError> {
    if !book_url.contains("/book/") {
        return Err(Book2PdfError::InvalidBookUrl {
            url: book_url.to_string(),
        });
    }

    info!("Resolving book metadata, this may take a moment");
    let landing = fetch_page(session, book_url).await?;

    let total_pages: u32 = PAGE_COUNT_RE
        .captures(&landing)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| Book2PdfError::PageCountNotFound {
            url: book_url.to_string(),
        })?;

    let title = TITLE_RE
        .captures(&landing)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or_else(|| Book2PdfError::TitleNotFound {
            url: book_url.to_string(),
        })?;

    let viewer_url = book_url.replace("/book/", "/viewer/");
    let viewer = fetch_page(session, &viewer_url).await?;

    let code = VIEWER_CODE_RE
        .captures(&viewer)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Book2PdfError::ViewerCodeNotFound { url: viewer_url })?;

    info!("Title: {title}");
    info!("Pages: {total_pages}");
    info!("Viewer code: {code}");

    Ok(BookInfo {
        code,
        title,
        total_pages,
    })
}

async fn fetch_page(session: &Session, url: &str) -> Result<String, Book2PdfError> {
    let response = session
        .get(url)
        .await
        .map_err(|e| Book2PdfError::MetadataRequestFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(Book2PdfError::MetadataRequestFailed {
            url: url.to_string(),
            reason: format!("HTTP {status}"),
        });
    }

    response
        .text()
        .await
        .map_err(|e| Book2PdfError::MetadataRequestFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

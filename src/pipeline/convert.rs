//! Page conversion: SVG markup → single-page PDF artifact.
//!
//! ## Why spawn_blocking?
//!
//! Parsing and rendering a page is pure CPU work; `spawn_blocking` keeps it
//! off the Tokio worker threads so in-flight fetches are not stalled behind
//! conversions. Conversion concurrency is deliberately unbounded — the
//! fetch gate does not apply here.
//!
//! usvg reports recoverable parse issues through the `log` facade under its
//! own targets; verbosity is set once at subscriber initialisation rather
//! than toggled around each call, so concurrent conversions never race on
//! logger state.

use crate::error::PageError;
use crate::scratch::Scratch;
use std::path::PathBuf;
use tracing::debug;

/// Render one page's SVG markup and write the artifact to
/// `{scratch}/{page}.pdf`.
///
/// The artifact location is derived purely from the page number, so
/// assembly can find it later with no bookkeeping beyond the registry.
pub async fn render_page(
    raw_svg: String,
    scratch: &Scratch,
    page: u32,
) -> Result<PathBuf, PageError> {
    let pdf = tokio::task::spawn_blocking(move || render_blocking(&raw_svg))
        .await
        .map_err(|e| PageError::Conversion {
            page,
            detail: format!("render task panicked: {e}"),
        })?
        .map_err(|detail| PageError::Conversion { page, detail })?;

    let path = scratch.page_path(page);
    tokio::fs::write(&path, &pdf)
        .await
        .map_err(|e| PageError::Conversion {
            page,
            detail: format!("failed to write artifact: {e}"),
        })?;

    debug!("Converted page {page} → {} ({} bytes)", path.display(), pdf.len());
    Ok(path)
}

/// Blocking implementation of the SVG → PDF rendering.
fn render_blocking(raw_svg: &str) -> Result<Vec<u8>, String> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(raw_svg, &options)
        .map_err(|e| format!("invalid page markup: {e:?}"))?;

    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| format!("rendering failed: {e:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="140" viewBox="0 0 100 140"><rect x="10" y="10" width="80" height="120" fill="#cccccc"/></svg>"##;

    #[tokio::test]
    async fn valid_markup_produces_artifact() {
        let scratch = Scratch::new(None).unwrap();
        let path = render_page(PAGE_SVG.to_string(), &scratch, 7).await.unwrap();

        assert_eq!(path, scratch.page_path(7));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"), "artifact should be a PDF");
    }

    #[tokio::test]
    async fn malformed_markup_is_conversion_error() {
        let scratch = Scratch::new(None).unwrap();
        let err = render_page("this is not svg".to_string(), &scratch, 2)
            .await
            .unwrap_err();

        match err {
            PageError::Conversion { page, .. } => assert_eq!(page, 2),
            other => panic!("expected Conversion, got {other:?}"),
        }
        assert!(!scratch.page_path(2).exists(), "no artifact on failure");
    }
}

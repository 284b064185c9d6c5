//! The per-page worker: fetch, convert, register — under the fetch gate.
//!
//! One worker task runs per page number. The gate permit is held only for
//! the network call: it is released before conversion starts, so a slow
//! render never blocks another page's fetch slot. A worker never lets an
//! error escape — a single slow or broken remote page must not abort the
//! run; the visible failure is a missing page in the output, not a crash.

use crate::error::PageError;
use crate::pipeline::{convert, fetch::PageFetcher};
use crate::progress::ProgressCallback;
use crate::registry::CompletionRegistry;
use crate::scratch::Scratch;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

/// Everything a page worker needs, shared across all workers of a run.
pub struct WorkerContext {
    pub fetcher: PageFetcher,
    pub scratch: Arc<Scratch>,
    pub registry: Arc<CompletionRegistry>,
    pub gate: Arc<Semaphore>,
    pub progress: Option<ProgressCallback>,
}

/// Run the fetch-and-convert sequence for one page.
///
/// Never returns an error: failures are logged, reported through the
/// progress callback, and the page is left out of the registry.
pub async fn run_page(ctx: Arc<WorkerContext>, page: u32) {
    match fetch_and_convert(&ctx, page).await {
        Ok(()) => {
            ctx.registry.add(page);
            if let Some(cb) = &ctx.progress {
                cb.on_page_complete(page);
            }
        }
        Err(err) => {
            warn!("Skipping page {page}: {err}");
            if let Some(cb) = &ctx.progress {
                cb.on_page_error(page, &err.to_string());
            }
        }
    }
}

async fn fetch_and_convert(ctx: &WorkerContext, page: u32) -> Result<(), PageError> {
    let raw = {
        // The permit covers the network call only; conversion below runs
        // outside the gate.
        let _permit = ctx
            .gate
            .acquire()
            .await
            .map_err(|_| PageError::Transport {
                page,
                detail: "fetch gate closed".into(),
            })?;
        ctx.fetcher.fetch(page).await?
    };

    convert::render_page(raw, &ctx.scratch, page).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, DownloadConfig};
    use crate::session::Session;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="140"><rect width="80" height="120" fill="#333333"/></svg>"##;

    async fn context_for(server: &MockServer) -> Arc<WorkerContext> {
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
        Arc::new(WorkerContext {
            fetcher: PageFetcher::new(session, "CODE"),
            scratch: Arc::new(Scratch::new(None).unwrap()),
            registry: Arc::new(CompletionRegistry::new()),
            gate: Arc::new(Semaphore::new(4)),
            progress: None,
        })
    }

    #[tokio::test]
    async fn successful_page_is_registered() {
        let server = MockServer::start().await;
        let ctx = context_for(&server).await;
        Mock::given(method("GET"))
            .and(path("/viewer/page/CODE/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_SVG))
            .mount(&server)
            .await;

        run_page(Arc::clone(&ctx), 1).await;

        assert!(ctx.registry.contains(1));
        assert!(ctx.scratch.page_path(1).exists());
    }

    #[tokio::test]
    async fn failed_fetch_is_contained() {
        let server = MockServer::start().await;
        let ctx = context_for(&server).await;
        Mock::given(method("GET"))
            .and(path("/viewer/page/CODE/2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        run_page(Arc::clone(&ctx), 2).await;

        assert!(!ctx.registry.contains(2));
        assert!(ctx.registry.is_empty());
    }

    #[tokio::test]
    async fn failed_conversion_is_contained() {
        let server = MockServer::start().await;
        let ctx = context_for(&server).await;
        Mock::given(method("GET"))
            .and(path("/viewer/page/CODE/3"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not markup at all"))
            .mount(&server)
            .await;

        run_page(Arc::clone(&ctx), 3).await;

        assert!(!ctx.registry.contains(3));
        assert!(!ctx.scratch.page_path(3).exists());
    }
}

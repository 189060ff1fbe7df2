//! Chromium-based renderer using chromiumoxide.

use super::{PageAnchors, RenderContext, RenderError, RenderResult, Renderer};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

/// Reads anchors after the page's own scripts had a chance to rewrite them
const COLLECT_HREFS_JS: &str = r#"({
    baseHref: document.querySelector('base[href]')?.getAttribute('href') ?? null,
    hrefs: Array.from(document.querySelectorAll('a[href]'), a => a.getAttribute('href')),
})"#;

/// URL schemes a rendered page may load
const LOCAL_SCHEMES: [&str; 4] = ["file:", "data:", "blob:", "about:"];

/// Headless Chromium renderer
///
/// A rendered page can run its scripts but cannot reach the network. Every
/// hostname resolves to nothing, and each tab fails any request that is not
/// for a local resource.
pub struct ChromiumRenderer {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Launches headless Chromium
    ///
    /// Without `executable`, chromiumoxide looks for an installed Chrome or
    /// Chromium on its own.
    pub async fn launch(executable: Option<&Path>) -> RenderResult<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--host-resolver-rules=MAP * ~NOTFOUND");
        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("Browser handler event error: {}", e);
                }
            }
        });

        tracing::info!("Launched headless Chromium");

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> RenderResult<Box<dyn RenderContext>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Context(e.to_string()))?;

        let interceptor = match block_network(&page).await {
            Ok(interceptor) => interceptor,
            Err(e) => {
                if let Err(close_err) = page.close().await {
                    tracing::debug!("Failed to close tab: {}", close_err);
                }
                return Err(e);
            }
        };

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            interceptor,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> RenderResult<()> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        let _ = browser.wait().await;
        self.handler.abort();
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// Pauses every request of the tab and lets only local ones through
async fn block_network(page: &Page) -> RenderResult<JoinHandle<()>> {
    let context_err = |e: chromiumoxide::error::CdpError| RenderError::Context(e.to_string());

    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(context_err)?;
    page.execute(EnableParams::default())
        .await
        .map_err(context_err)?;

    let page = page.clone();
    Ok(tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let request_id = event.request_id.clone();
            let result = if is_local_request(&event.request.url) {
                page.execute(ContinueRequestParams::new(request_id))
                    .await
                    .map(drop)
            } else {
                tracing::trace!("Blocked render request to {}", event.request.url);
                page.execute(FailRequestParams::new(request_id, ErrorReason::BlockedByClient))
                    .await
                    .map(drop)
            };
            if let Err(e) = result {
                tracing::trace!("Failed to answer paused request: {}", e);
            }
        }
    }))
}

fn is_local_request(url: &str) -> bool {
    LOCAL_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
}

/// A single Chromium tab
struct ChromiumContext {
    page: Page,
    interceptor: JoinHandle<()>,
    active_count: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn collect_hrefs(&mut self, file_url: &Url) -> RenderResult<PageAnchors> {
        self.page
            .goto(file_url.as_str())
            .await
            .map_err(|e| RenderError::Navigation {
                url: file_url.to_string(),
                message: e.to_string(),
            })?;

        self.page
            .evaluate(COLLECT_HREFS_JS)
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?
            .into_value::<PageAnchors>()
            .map_err(|e| RenderError::Script(e.to_string()))
    }

    async fn close(self: Box<Self>) -> RenderResult<()> {
        let this = *self;
        this.active_count.fetch_sub(1, Ordering::Relaxed);
        this.interceptor.abort();
        if let Err(e) = this.page.close().await {
            tracing::debug!("Failed to close tab: {}", e);
        }
        Ok(())
    }
}

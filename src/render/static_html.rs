use super::{PageAnchors, RenderContext, RenderError, RenderResult, Renderer};
use crate::crawler::{anchor_hrefs, base_href};
use async_trait::async_trait;
use scraper::Html;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

/// Reads anchors straight from the stored HTML, without running scripts
///
/// Links that a page only creates from script are missed.
#[derive(Debug, Default)]
pub struct StaticRenderer {
    active_count: Arc<AtomicUsize>,
}

impl StaticRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Renderer for StaticRenderer {
    async fn new_context(&self) -> RenderResult<Box<dyn RenderContext>> {
        self.active_count.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(StaticContext {
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> RenderResult<()> {
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

struct StaticContext {
    active_count: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderContext for StaticContext {
    async fn collect_hrefs(&mut self, file_url: &Url) -> RenderResult<PageAnchors> {
        let path = file_url
            .to_file_path()
            .map_err(|_| RenderError::NotAFile(file_url.to_string()))?;
        let bytes = tokio::fs::read(&path).await?;
        Ok(anchors_of(&String::from_utf8_lossy(&bytes)))
    }

    async fn close(self: Box<Self>) -> RenderResult<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }
}

fn anchors_of(html: &str) -> PageAnchors {
    let document = Html::parse_document(html);
    PageAnchors {
        base_href: base_href(&document),
        hrefs: anchor_hrefs(&document),
    }
}

//! Render sandbox abstraction for the extractor
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over the
//! engine used to load a mirrored page and read its anchors:
//! - `ChromiumRenderer`: headless Chromium, scripts run, no network access
//! - `StaticRenderer`: parses the stored HTML as-is

mod chromium;
mod static_html;

pub use chromium::ChromiumRenderer;
pub use static_html::StaticRenderer;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Errors raised by a render sandbox
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to open render context: {0}")]
    Context(String),

    #[error("Failed to load {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Not a local file URL: {0}")]
    NotAFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Anchors of a rendered document, as their raw attribute values
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnchors {
    /// `href` of the first `<base href>` element, if any
    pub base_href: Option<String>,

    /// `href` of every anchor, in document order
    pub hrefs: Vec<String>,
}

/// An engine that hands out isolated rendering contexts
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Opens a new context (a browser tab, for Chromium)
    async fn new_context(&self) -> RenderResult<Box<dyn RenderContext>>;

    /// Shuts the engine down; contexts must be closed first
    async fn shutdown(&self) -> RenderResult<()>;

    /// Number of contexts opened and not yet closed
    fn active_contexts(&self) -> usize;
}

/// A single context that renders one local document at a time
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Loads a `file://` document and returns its raw anchor and base
    /// hrefs, read after the page's scripts ran
    async fn collect_hrefs(&mut self, file_url: &Url) -> RenderResult<PageAnchors>;

    /// Releases the context's resources
    async fn close(self: Box<Self>) -> RenderResult<()>;
}

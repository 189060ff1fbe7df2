//! Fedlex-Mirror: a resumable site mirror and link-graph extractor
//!
//! This crate builds an offline mirror of a document website discovered
//! through its sitemaps, and derives a directed link graph between the
//! mirrored pages. Both the fetcher and the extractor keep append-only
//! ledgers so either may be interrupted and restarted without redoing work.

pub mod config;
pub mod crawler;
pub mod extractor;
pub mod ledger;
pub mod output;
pub mod render;
pub mod sitemap;
pub mod url;

use thiserror::Error;

/// Main error type for Fedlex-Mirror operations
///
/// Only setup-phase failures and ledger write failures surface as this
/// type; per-page problems are logged and isolated inside the worker pools.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),

    #[error("Render error: {0}")]
    Render(#[from] render::RenderError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No page URLs could be resolved from {sitemaps} sitemap roots")]
    NoUrlsResolved { sitemaps: usize },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Fedlex-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use ledger::{EdgeLedger, ProgressLedger};
pub use url::{PathMapper, SiteScope};

//! Sitemap resolution
//!
//! Turns the configured root sitemaps into the flat list of page URLs the
//! fetch pool works through, and caches that list between runs.

mod cache;
mod parser;
mod resolver;

pub use cache::{load_cache, store_cache};
pub use parser::{parse_sitemap, SitemapDocument};
pub use resolver::{dedup_preserving_order, SitemapError, SitemapResolver, MAX_SITEMAP_DEPTH};

use crate::{MirrorError, Result};
use std::path::Path;

/// Returns the page URL list, preferring the cache when it has entries
///
/// A fresh resolution is cached before returning. A resolution that finds
/// no URLs at all is an error and is not cached.
pub async fn load_or_resolve(
    resolver: &SitemapResolver,
    roots: &[String],
    cache_path: &Path,
) -> Result<Vec<String>> {
    if let Some(urls) = load_cache(cache_path)? {
        tracing::info!("Loaded {} URLs from cache {}", urls.len(), cache_path.display());
        return Ok(urls);
    }

    let urls = resolver.resolve(roots).await;
    if urls.is_empty() {
        return Err(MirrorError::NoUrlsResolved {
            sitemaps: roots.len(),
        });
    }

    store_cache(cache_path, &urls)?;
    tracing::info!("Cached {} URLs to {}", urls.len(), cache_path.display());
    Ok(urls)
}

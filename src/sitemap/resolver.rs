use super::parser::{parse_sitemap, SitemapDocument};
use futures::future::BoxFuture;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Sitemaps nested deeper than this are ignored
pub const MAX_SITEMAP_DEPTH: usize = 8;

/// Reasons a single sitemap contributes no URLs
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),
}

/// Flattens a tree of sitemap indexes into an ordered list of page URLs
pub struct SitemapResolver {
    client: Client,
    timeout: Duration,
    max_depth: usize,
}

/// Mutable state of one resolution pass
#[derive(Default)]
struct Walk {
    visited: HashSet<String>,
    pages: Vec<String>,
}

impl SitemapResolver {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            max_depth: MAX_SITEMAP_DEPTH,
        }
    }

    /// Resolves every root, depth-first, into a deduplicated page list
    ///
    /// Page URLs keep the order in which they were first seen. A sitemap
    /// that cannot be fetched or parsed is logged and contributes nothing;
    /// a sitemap already visited during this pass is not fetched again.
    pub async fn resolve(&self, roots: &[String]) -> Vec<String> {
        let mut walk = Walk::default();

        for root in roots {
            tracing::info!("Parsing: {}", root);
            self.resolve_node(root, 0, &mut walk).await;
        }

        dedup_preserving_order(walk.pages)
    }

    fn resolve_node<'a>(
        &'a self,
        url: &'a str,
        depth: usize,
        walk: &'a mut Walk,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if depth > self.max_depth {
                tracing::warn!("Sitemap {} exceeds nesting depth {}, skipping", url, self.max_depth);
                return;
            }
            if !walk.visited.insert(url.to_string()) {
                tracing::debug!("Sitemap {} already visited", url);
                return;
            }

            match self.fetch_document(url).await {
                Ok(SitemapDocument::Index(children)) => {
                    tracing::debug!("  -> Index with {} sitemaps", children.len());
                    for child in &children {
                        self.resolve_node(child, depth + 1, walk).await;
                    }
                }
                Ok(SitemapDocument::Leaf(pages)) => {
                    tracing::info!("  -> Found {} URLs", pages.len());
                    walk.pages.extend(pages);
                }
                Ok(SitemapDocument::Unparseable(reason)) => {
                    tracing::warn!("Error parsing sitemap {}: {}", url, reason);
                }
                Err(e) => {
                    tracing::warn!("Error fetching sitemap {}: {}", url, e);
                }
            }
        })
    }

    async fn fetch_document(&self, url: &str) -> Result<SitemapDocument, SitemapError> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SitemapError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(parse_sitemap(&body))
    }
}

/// Removes exact duplicates, keeping each URL's first occurrence
pub fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(urls.len());
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

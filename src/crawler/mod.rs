//! Fetch subsystem: downloads every sitemap page into the mirror
//!
//! This module contains the network side of the mirror, including:
//! - HTTP fetching with the rate-limit cooldown
//! - HTML anchor extraction for fetch-time edges
//! - The bounded-concurrency fetch pool

mod fetcher;
mod parser;
mod pool;

pub use fetcher::{build_http_client, fetch_url, fetch_with_cooldown, FetchResult};
pub use parser::{anchor_hrefs, base_href, document_base, parse_html, ParsedPage};
pub use pool::{FetchPool, FetchSummary};

use crate::config::Config;
use crate::ledger::{EdgeLedger, ProgressLedger};
use crate::sitemap::{load_or_resolve, SitemapResolver};
use crate::url::{PathMapper, SiteScope};
use crate::Result;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Runs a complete fetch
///
/// This is the main entry point of the `fetch` command. It will:
/// 1. Load the cached URL list, or resolve and cache the sitemaps
/// 2. Open the fetch-progress and edge ledgers
/// 3. Drop URLs that are already completed or outside the allowed hosts
/// 4. Run the fetch pool over the rest
pub async fn run_fetch(config: &Config) -> Result<FetchSummary> {
    let scope = SiteScope::from_config(&config.site);
    let client = build_http_client(&config.user_agent, &scope, config.fetcher.request_timeout())?;

    let resolver = SitemapResolver::new(client.clone(), config.fetcher.sitemap_timeout());
    let urls = load_or_resolve(&resolver, &config.site.sitemaps, &config.output.urls_cache).await?;

    let progress = Arc::new(ProgressLedger::open(&config.output.fetch_progress)?);
    let edges = Arc::new(EdgeLedger::open(&config.output.edges)?);

    let total = urls.len();
    let pending = pending_urls(urls, &progress, &scope);
    tracing::info!(
        "{} URLs total, {} already fetched, {} to fetch",
        total,
        progress.len(),
        pending.len()
    );

    let pool = FetchPool::new(
        client,
        scope,
        PathMapper::new(&config.output.mirror_dir),
        progress,
        edges,
        &config.fetcher,
    );
    pool.run(pending).await
}

/// Returns the URLs still to fetch, in input order
///
/// Completed URLs, duplicates and URLs on hosts outside the allow-list are
/// dropped.
pub fn pending_urls(urls: Vec<String>, progress: &ProgressLedger, scope: &SiteScope) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| !progress.contains(url))
        .filter(|url| match Url::parse(url) {
            Ok(parsed) if scope.is_allowed_host(&parsed) => true,
            Ok(_) => {
                tracing::debug!("Skipping {}: host not allowed", url);
                false
            }
            Err(e) => {
                tracing::warn!("Skipping invalid URL {}: {}", url, e);
                false
            }
        })
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

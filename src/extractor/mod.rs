//! Extract subsystem: derives the link graph from the mirror
//!
//! Pages are rendered from their local mirror file, never from the
//! network, and their anchors are resolved against the canonical URL.

mod links;
mod pool;

pub use links::page_targets;
pub use pool::{ExtractPool, ExtractSummary, PageError};

use crate::config::Config;
use crate::ledger::{EdgeLedger, ProgressLedger};
use crate::render::Renderer;
use crate::url::{PathMapper, SiteScope};
use crate::Result;

/// Runs a complete extraction with the given render sandbox
///
/// Only URLs that the fetcher completed, that have a mirror file on disk
/// and that are not yet extract-completed are rendered. The renderer is
/// shut down before returning, whatever the outcome.
pub async fn run_extract(config: &Config, renderer: &dyn Renderer) -> Result<ExtractSummary> {
    let outcome = extract_with(config, renderer).await;

    if let Err(e) = renderer.shutdown().await {
        tracing::warn!("Failed to shut down renderer: {}", e);
    }
    outcome
}

async fn extract_with(config: &Config, renderer: &dyn Renderer) -> Result<ExtractSummary> {
    let fetched = ProgressLedger::load(&config.output.fetch_progress)?;
    let progress = ProgressLedger::open(&config.output.extract_progress)?;
    let mapper = PathMapper::new(&config.output.mirror_dir);

    let pending = pending_urls(&fetched, &progress, &mapper);
    tracing::info!(
        "{} fetched URLs, {} already extracted, {} to extract",
        fetched.len(),
        progress.len(),
        pending.len()
    );

    let edges = EdgeLedger::open(&config.output.edges)?;
    let pool = ExtractPool::new(
        SiteScope::from_config(&config.site),
        mapper,
        progress,
        edges,
        &config.extractor,
    );
    pool.run(renderer, pending).await
}

/// Returns fetch-completed URLs still to extract, in fetch-ledger order
///
/// URLs whose mirror file is missing (fetched by another machine, or
/// removed since) are skipped.
pub fn pending_urls(fetched: &[String], progress: &ProgressLedger, mapper: &PathMapper) -> Vec<String> {
    let mut missing = 0usize;
    let pending: Vec<String> = fetched
        .iter()
        .filter(|url| !progress.contains(url))
        .filter(|url| {
            let exists = mapper.map(url).is_file();
            if !exists {
                tracing::debug!("No mirror file for {}", url);
                missing += 1;
            }
            exists
        })
        .cloned()
        .collect();

    if missing > 0 {
        tracing::info!("Skipping {} fetched URLs with no mirror file", missing);
    }
    pending
}

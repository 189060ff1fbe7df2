//! Batch-synchronous render pool
//!
//! Pending URLs are cut into batches the size of the concurrency limit.
//! A batch opens all of its contexts, renders every page concurrently,
//! then closes every context before the next batch starts.

use super::links::page_targets;
use crate::config::ExtractorConfig;
use crate::ledger::{EdgeLedger, LedgerError, LedgerResult, ProgressLedger};
use crate::output::ProgressReporter;
use crate::render::{RenderContext, RenderError, Renderer};
use crate::url::{PathMapper, SiteScope};
use crate::Result;
use futures::future::join_all;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a single page was abandoned for this run
#[derive(Debug, Error)]
pub enum PageError {
    #[error("invalid page URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("mirror file unavailable: {0}")]
    MirrorFile(#[from] std::io::Error),

    #[error("cannot address mirror file {0} by URL")]
    FileUrl(String),

    #[error("no render context: {0}")]
    Context(String),

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("render timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// Totals of one extract run
#[derive(Debug, Clone, Default)]
pub struct ExtractSummary {
    /// Pages rendered and recorded as completed
    pub extracted: u64,
    /// Pages abandoned for this run
    pub failed: u64,
    /// Edges appended by this run
    pub edges: u64,
    pub elapsed: Duration,
    /// True if the run was stopped by Ctrl-C
    pub interrupted: bool,
}

/// Renders mirrored pages and appends their in-domain links as edges
pub struct ExtractPool {
    scope: SiteScope,
    mapper: PathMapper,
    progress: ProgressLedger,
    edges: EdgeLedger,
    batch_size: usize,
    render_timeout: Duration,
    progress_interval: u64,
}

impl ExtractPool {
    pub fn new(
        scope: SiteScope,
        mapper: PathMapper,
        progress: ProgressLedger,
        edges: EdgeLedger,
        config: &ExtractorConfig,
    ) -> Self {
        Self {
            scope,
            mapper,
            progress,
            edges,
            batch_size: config.max_concurrent_renders.max(1) as usize,
            render_timeout: config.render_timeout(),
            progress_interval: config.progress_interval,
        }
    }

    /// Renders every pending URL, one batch at a time
    ///
    /// Returns early on Ctrl-C (between or during batches) or on a ledger
    /// write failure; render failures only mark their page as failed.
    pub async fn run(&self, renderer: &dyn Renderer, pending: Vec<String>) -> Result<ExtractSummary> {
        let mut reporter =
            ProgressReporter::new("Extracted", pending.len() as u64, self.progress_interval);
        let mut summary = ExtractSummary::default();

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        for batch in pending.chunks(self.batch_size) {
            tokio::select! {
                result = self.process_batch(renderer, batch, &mut reporter, &mut summary) => result?,
                _ = &mut ctrl_c => {
                    tracing::warn!("Interrupted, abandoning the current batch of {} pages", batch.len());
                    summary.interrupted = true;
                    break;
                }
            }
        }

        reporter.finish();
        summary.elapsed = reporter.elapsed();
        tracing::info!(
            "Extraction finished: {} pages, {} failed, {} edges in {:.1}s ({:.1} pages/sec)",
            summary.extracted,
            summary.failed,
            summary.edges,
            summary.elapsed.as_secs_f64(),
            reporter.rate()
        );

        Ok(summary)
    }

    async fn process_batch(
        &self,
        renderer: &dyn Renderer,
        batch: &[String],
        reporter: &mut ProgressReporter,
        summary: &mut ExtractSummary,
    ) -> Result<()> {
        let opened = join_all(batch.iter().map(|_| renderer.new_context())).await;
        let mut slots: Vec<_> = batch.iter().zip(opened).collect();

        let outcomes = join_all(slots.iter_mut().map(|slot| {
            let url: &str = slot.0;
            let context = &mut slot.1;
            async move {
                let outcome = match context {
                    Ok(context) => self.extract_page(context.as_mut(), url).await,
                    Err(e) => Ok(Err(PageError::Context(e.to_string()))),
                };
                (url, outcome)
            }
        }))
        .await;

        let contexts: Vec<Box<dyn RenderContext>> = slots
            .into_iter()
            .filter_map(|(_, context)| context.ok())
            .collect();
        for result in join_all(contexts.into_iter().map(|context| context.close())).await {
            if let Err(e) = result {
                tracing::debug!("Failed to close render context: {}", e);
            }
        }

        let mut fatal: Option<LedgerError> = None;
        for (url, outcome) in outcomes {
            match outcome {
                Ok(Ok(edges)) => {
                    summary.extracted += 1;
                    summary.edges += edges;
                }
                Ok(Err(e)) => {
                    tracing::warn!("Error extracting links from {}: {}", url, e);
                    summary.failed += 1;
                }
                Err(e) => {
                    fatal.get_or_insert(e);
                    continue;
                }
            }
            reporter.tick();
        }

        match fatal {
            Some(e) => {
                tracing::error!("Ledger write failed, stopping extraction: {}", e);
                Err(e.into())
            }
            None => Ok(()),
        }
    }

    /// Renders one page and records its edges, then the page itself
    ///
    /// The outer result carries ledger failures, the inner one page failures.
    async fn extract_page(
        &self,
        context: &mut dyn RenderContext,
        url: &str,
    ) -> LedgerResult<std::result::Result<u64, PageError>> {
        let targets = match self.render_targets(context, url).await {
            Ok(targets) => targets,
            Err(e) => return Ok(Err(e)),
        };

        for target in &targets {
            self.edges.append(url, target.as_str())?;
        }
        self.progress.record(url)?;

        tracing::debug!("Extracted {} links from {}", targets.len(), url);
        Ok(Ok(targets.len() as u64))
    }

    async fn render_targets(
        &self,
        context: &mut dyn RenderContext,
        url: &str,
    ) -> std::result::Result<Vec<Url>, PageError> {
        let source = Url::parse(url)?;

        let path = tokio::fs::canonicalize(self.mapper.map(url)).await?;
        let file_url =
            Url::from_file_path(&path).map_err(|_| PageError::FileUrl(path.display().to_string()))?;

        let anchors = tokio::time::timeout(self.render_timeout, context.collect_hrefs(&file_url))
            .await
            .map_err(|_| PageError::Timeout(self.render_timeout))??;

        Ok(page_targets(&source, &anchors, &self.scope))
    }
}

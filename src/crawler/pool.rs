//! Bounded-concurrency fetch pool
//!
//! A single dispatcher owns the work queue and the set of URLs scheduled
//! this session. Page tasks run the whole per-URL pipeline (fetch, persist,
//! edges, progress) and hand discovered document links back to the
//! dispatcher, which is the only place the queue grows.

use super::fetcher::{fetch_with_cooldown, FetchResult};
use super::parser::parse_html;
use crate::config::FetcherConfig;
use crate::ledger::{check_entry, EdgeLedger, LedgerResult, ProgressLedger};
use crate::output::ProgressReporter;
use crate::url::{resolve_link, PathMapper, SiteScope};
use crate::Result;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use url::Url;

/// Totals of one fetch run
#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    /// Pages written to the mirror and recorded as completed
    pub saved: u64,
    /// Pages abandoned for this run
    pub failed: u64,
    /// Document links added to the queue while fetching
    pub followed: u64,
    /// Edges appended by this run
    pub edges: u64,
    pub elapsed: Duration,
    /// True if the run was stopped by Ctrl-C
    pub interrupted: bool,
}

/// Shared, read-only state handed to every page task
struct PageContext {
    client: Client,
    scope: SiteScope,
    mapper: PathMapper,
    progress: Arc<ProgressLedger>,
    edges: Arc<EdgeLedger>,
    request_delay: Duration,
    cooldown: Duration,
}

/// What one page task reports back to the dispatcher
#[derive(Debug)]
struct PageOutcome {
    saved: bool,
    edges: u64,
    follow_ups: Vec<String>,
}

impl PageOutcome {
    fn failed() -> Self {
        Self {
            saved: false,
            edges: 0,
            follow_ups: Vec::new(),
        }
    }
}

/// Fetches pending URLs into the mirror with bounded parallelism
pub struct FetchPool {
    context: Arc<PageContext>,
    max_concurrent: usize,
    progress_interval: u64,
}

impl FetchPool {
    pub fn new(
        client: Client,
        scope: SiteScope,
        mapper: PathMapper,
        progress: Arc<ProgressLedger>,
        edges: Arc<EdgeLedger>,
        config: &FetcherConfig,
    ) -> Self {
        Self {
            context: Arc::new(PageContext {
                client,
                scope,
                mapper,
                progress,
                edges,
                request_delay: config.request_delay(),
                cooldown: config.rate_limit_cooldown(),
            }),
            max_concurrent: config.max_concurrent_requests.max(1) as usize,
            progress_interval: config.progress_interval,
        }
    }

    /// Fetches every URL in `pending`, plus the documents they link to
    ///
    /// Returns when the queue is drained, or early on Ctrl-C. A ledger
    /// write failure aborts the in-flight tasks and is returned as an error;
    /// every other per-page failure is logged and counted.
    pub async fn run(&self, pending: Vec<String>) -> Result<FetchSummary> {
        let mut queue: VecDeque<String> = pending.into_iter().collect();
        let mut scheduled: HashSet<String> = queue.iter().cloned().collect();
        let mut reporter =
            ProgressReporter::new("Fetched", queue.len() as u64, self.progress_interval);
        let mut summary = FetchSummary::default();
        let mut tasks: JoinSet<LedgerResult<PageOutcome>> = JoinSet::new();

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            while tasks.len() < self.max_concurrent {
                let Some(url) = queue.pop_front() else { break };
                tasks.spawn(fetch_page(Arc::clone(&self.context), url));
            }

            if tasks.is_empty() {
                break;
            }

            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::warn!(
                        "Interrupted, stopping {} in-flight fetches ({} queued)",
                        tasks.len(),
                        queue.len()
                    );
                    summary.interrupted = true;
                    tasks.abort_all();
                    break;
                }
                joined = tasks.join_next() => {
                    let Some(joined) = joined else { break };
                    let outcome = match joined {
                        Ok(Ok(outcome)) => outcome,
                        Ok(Err(e)) => {
                            tracing::error!("Ledger write failed, stopping fetch: {}", e);
                            tasks.abort_all();
                            while tasks.join_next().await.is_some() {}
                            return Err(e.into());
                        }
                        Err(e) => {
                            tracing::warn!("Fetch task ended abnormally: {}", e);
                            PageOutcome::failed()
                        }
                    };

                    if outcome.saved {
                        summary.saved += 1;
                    } else {
                        summary.failed += 1;
                    }
                    summary.edges += outcome.edges;

                    for link in outcome.follow_ups {
                        if self.context.progress.contains(&link) || !scheduled.insert(link.clone()) {
                            continue;
                        }
                        tracing::debug!("Queueing linked document {}", link);
                        queue.push_back(link);
                        reporter.grow(1);
                        summary.followed += 1;
                    }

                    reporter.tick();
                }
            }
        }

        while tasks.join_next().await.is_some() {}

        reporter.finish();
        summary.elapsed = reporter.elapsed();
        tracing::info!(
            "Fetch finished: {} saved, {} failed, {} documents followed, {} edges in {:.1}s ({:.1} pages/sec)",
            summary.saved,
            summary.failed,
            summary.followed,
            summary.edges,
            summary.elapsed.as_secs_f64(),
            reporter.rate()
        );

        Ok(summary)
    }
}

/// Runs the per-URL pipeline: delay, fetch, persist, edges, progress
///
/// Only ledger failures are returned as errors. A URL that cannot be
/// written as a ledger line is abandoned before it is requested.
async fn fetch_page(ctx: Arc<PageContext>, url: String) -> LedgerResult<PageOutcome> {
    if let Err(e) = check_entry(&url) {
        tracing::warn!("Skipping {:?}: {}", url, e);
        return Ok(PageOutcome::failed());
    }

    tokio::time::sleep(ctx.request_delay).await;

    let (content_type, body) = match fetch_with_cooldown(&ctx.client, &url, ctx.cooldown).await {
        FetchResult::Success {
            content_type, body, ..
        } => (content_type, body),
        FetchResult::RateLimited => {
            tracing::warn!("Still rate limited on {} after cooldown, giving up for this run", url);
            return Ok(PageOutcome::failed());
        }
        FetchResult::HttpError { status_code } => {
            tracing::warn!("Error fetching {}: HTTP {}", url, status_code);
            return Ok(PageOutcome::failed());
        }
        FetchResult::NetworkError { error } => {
            tracing::warn!("Error fetching {}: {}", url, error);
            return Ok(PageOutcome::failed());
        }
    };

    let path = ctx.mapper.map(&url);
    if let Err(e) = write_mirror_file(&path, &body).await {
        tracing::warn!("Error saving {} to {}: {}", url, path.display(), e);
        return Ok(PageOutcome::failed());
    }
    tracing::debug!("Saved {} to {}", url, path.display());

    let mut outcome = PageOutcome {
        saved: true,
        edges: 0,
        follow_ups: Vec::new(),
    };

    if content_type.contains("html") {
        match Url::parse(&url) {
            Ok(page_url) => record_links(&ctx, &url, &page_url, &body, &mut outcome)?,
            Err(e) => tracing::warn!("Cannot resolve links of {}: {}", url, e),
        }
    }

    ctx.progress.record(&url)?;
    Ok(outcome)
}

/// Appends one edge per in-domain anchor and collects document follow-ups
fn record_links(
    ctx: &PageContext,
    source: &str,
    page_url: &Url,
    body: &[u8],
    outcome: &mut PageOutcome,
) -> LedgerResult<()> {
    let html = String::from_utf8_lossy(body);
    let parsed = parse_html(&html, page_url);

    for href in &parsed.hrefs {
        let Some(target) = resolve_link(href, &parsed.base) else {
            tracing::trace!("Skipping href {:?} on {}", href, source);
            continue;
        };
        if target == *page_url || !ctx.scope.is_in_domain(&target) {
            continue;
        }

        ctx.edges.append(source, target.as_str())?;
        outcome.edges += 1;

        if ctx.scope.is_allowed_host(&target) && ctx.scope.is_followed_document(&target) {
            outcome.follow_ups.push(target.to_string());
        }
    }

    Ok(())
}

/// Writes the raw body, replacing any previous copy
async fn write_mirror_file(path: &Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, body).await
}

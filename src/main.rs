//! Fedlex-Mirror main entry point
//!
//! This is the command-line interface for the Fedlex offline mirror and
//! link-graph extractor.

use anyhow::Context;
use clap::{Parser, Subcommand};
use fedlex_mirror::config::{load_config_with_hash, validate, Config};
use fedlex_mirror::crawler::run_fetch;
use fedlex_mirror::extractor::run_extract;
use fedlex_mirror::render::{ChromiumRenderer, Renderer, StaticRenderer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Fedlex-Mirror: a resumable site mirror and link-graph extractor
///
/// `fetch` downloads every page listed in the site's sitemaps into a local
/// mirror; `extract` renders the mirrored pages offline and records their
/// in-domain links. Both commands resume where an interrupted run stopped.
#[derive(Parser, Debug)]
#[command(name = "fedlex-mirror")]
#[command(version = "1.0.0")]
#[command(about = "A resumable site mirror and link-graph extractor", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults if omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every sitemap page (and linked PDF/XML documents) into the mirror
    Fetch,

    /// Render mirrored pages offline and record their in-domain links
    Extract {
        /// Parse stored HTML without running scripts (no browser needed)
        #[arg(long)]
        static_render: bool,
    },

    /// Resolve and cache the sitemap URL list, then exit
    Resolve,

    /// Show statistics from the ledgers and exit
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Fetch => handle_fetch(&config).await,
        Command::Extract { static_render } => handle_extract(&config, static_render).await,
        Command::Resolve => handle_resolve(&config).await,
        Command::Stats => handle_stats(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fedlex_mirror=info,warn"),
            1 => EnvFilter::new("fedlex_mirror=debug,info"),
            2 => EnvFilter::new("fedlex_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the built-in defaults
fn load(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            let config = Config::default();
            validate(&config).context("Built-in configuration is invalid")?;
            tracing::debug!("Using built-in configuration");
            Ok(config)
        }
    }
}

/// Handles the fetch command
async fn handle_fetch(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Fetching into {} with {} concurrent requests",
        config.output.mirror_dir.display(),
        config.fetcher.max_concurrent_requests
    );

    let summary = run_fetch(config).await.context("Fetch failed")?;
    if summary.interrupted {
        tracing::warn!("Fetch interrupted; run again to resume");
    }
    Ok(())
}

/// Handles the extract command
async fn handle_extract(config: &Config, static_render: bool) -> anyhow::Result<()> {
    let renderer: Box<dyn Renderer> = if static_render {
        tracing::info!("Using static HTML renderer; script-generated links are not seen");
        Box::new(StaticRenderer::new())
    } else {
        let renderer = ChromiumRenderer::launch(config.extractor.chrome_executable.as_deref())
            .await
            .context("Failed to start headless Chromium (use --static-render to run without it)")?;
        Box::new(renderer)
    };

    let summary = run_extract(config, renderer.as_ref())
        .await
        .context("Extraction failed")?;
    if summary.interrupted {
        tracing::warn!("Extraction interrupted; run again to resume");
    }
    Ok(())
}

/// Handles the resolve command: fills the URL cache
async fn handle_resolve(config: &Config) -> anyhow::Result<()> {
    use fedlex_mirror::crawler::build_http_client;
    use fedlex_mirror::sitemap::{load_or_resolve, SitemapResolver};
    use fedlex_mirror::SiteScope;

    let scope = SiteScope::from_config(&config.site);
    let client = build_http_client(&config.user_agent, &scope, config.fetcher.request_timeout())?;
    let resolver = SitemapResolver::new(client, config.fetcher.sitemap_timeout());
    let urls = load_or_resolve(&resolver, &config.site.sitemaps, &config.output.urls_cache)
        .await
        .context("Sitemap resolution failed")?;

    println!(
        "{} URLs in {}",
        urls.len(),
        config.output.urls_cache.display()
    );
    Ok(())
}

/// Handles the stats command
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use fedlex_mirror::output::{load_statistics, print_statistics};

    let stats = load_statistics(&config.output).context("Failed to read ledgers")?;
    print_statistics(&stats);
    Ok(())
}

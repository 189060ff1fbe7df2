use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root sitemaps published by the mirrored site
///
/// The index is listed together with its children; already visited sitemaps
/// are skipped during resolution, so the overlap costs nothing.
pub const DEFAULT_SITEMAPS: &[&str] = &[
    "https://www.fedlex.admin.ch/sitemap-index.xml",
    "https://www.fedlex.admin.ch/sitemap-consultations-1.xml",
    "https://www.fedlex.admin.ch/sitemap-treaty-1.xml",
    "https://www.fedlex.admin.ch/sitemap-treaty-2.xml",
    "https://www.fedlex.admin.ch/sitemap-treaty-3.xml",
    "https://www.fedlex.admin.ch/sitemap-treaty-4.xml",
    "https://www.fedlex.admin.ch/sitemap-treaty-5.xml",
    "https://www.fedlex.admin.ch/sitemap-treaty-6.xml",
    "https://www.fedlex.admin.ch/sitemap-treaty-7.xml",
    "https://www.fedlex.admin.ch/sitemap-treaty-8.xml",
    "https://www.fedlex.admin.ch/sitemap-treaty-9.xml",
    "https://www.fedlex.admin.ch/sitemap-treaty-10.xml",
    "https://www.fedlex.admin.ch/sitemap-act-1.xml",
    "https://www.fedlex.admin.ch/sitemap-act-2.xml",
    "https://www.fedlex.admin.ch/sitemap-act-3.xml",
    "https://www.fedlex.admin.ch/sitemap-act-4.xml",
    "https://www.fedlex.admin.ch/sitemap-act-5.xml",
    "https://www.fedlex.admin.ch/sitemap-act-6.xml",
    "https://www.fedlex.admin.ch/sitemap-act-7.xml",
    "https://www.fedlex.admin.ch/sitemap-act-8.xml",
    "https://www.fedlex.admin.ch/sitemap-act-9.xml",
    "https://www.fedlex.admin.ch/sitemap-act-10.xml",
    "https://www.fedlex.admin.ch/sitemap-act-11.xml",
    "https://www.fedlex.admin.ch/sitemap-act-12.xml",
    "https://www.fedlex.admin.ch/sitemap-act-13.xml",
    "https://www.fedlex.admin.ch/sitemap-act-14.xml",
    "https://www.fedlex.admin.ch/sitemap-act-15.xml",
    "https://www.fedlex.admin.ch/sitemap-act-16.xml",
    "https://www.fedlex.admin.ch/sitemap-act-17.xml",
    "https://www.fedlex.admin.ch/sitemap-act-18.xml",
    "https://www.fedlex.admin.ch/sitemap-act-19.xml",
    "https://www.fedlex.admin.ch/sitemap-act-20.xml",
    "https://www.fedlex.admin.ch/sitemap-act-21.xml",
    "https://www.fedlex.admin.ch/sitemap-act-22.xml",
    "https://www.fedlex.admin.ch/sitemap-act-23.xml",
    "https://www.fedlex.admin.ch/sitemap-act-24.xml",
    "https://www.fedlex.admin.ch/sitemap-act-25.xml",
    "https://www.fedlex.admin.ch/sitemap-act-26.xml",
    "https://www.fedlex.admin.ch/sitemap-act-27.xml",
    "https://www.fedlex.admin.ch/sitemap-cc1-1.xml",
    "https://www.fedlex.admin.ch/sitemap-cc1-2.xml",
];

/// Main configuration structure for Fedlex-Mirror
///
/// Every section is optional; a missing section falls back to the built-in
/// constants, so both run commands work without a config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub fetcher: FetcherConfig,
    pub extractor: ExtractorConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// The site being mirrored
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Domain suffix used for the in-domain test on link targets
    pub domain: String,

    /// Exact hosts the fetcher may request
    #[serde(rename = "allowed-hosts")]
    pub allowed_hosts: Vec<String>,

    /// Root sitemap URLs
    pub sitemaps: Vec<String>,

    /// Extensions of in-page links that become additional fetch targets
    #[serde(rename = "follow-extensions")]
    pub follow_extensions: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: "fedlex.admin.ch".to_string(),
            allowed_hosts: vec![
                "www.fedlex.admin.ch".to_string(),
                "fedlex.admin.ch".to_string(),
            ],
            sitemaps: DEFAULT_SITEMAPS.iter().map(|s| s.to_string()).collect(),
            follow_extensions: vec!["pdf".to_string(), "xml".to_string()],
        }
    }
}

/// Network fetcher behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Maximum number of requests in flight
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Delay each worker waits before issuing a request (milliseconds)
    #[serde(rename = "request-delay")]
    pub request_delay: u64,

    /// Cooldown after an HTTP 429 before the single retry (milliseconds)
    #[serde(rename = "rate-limit-cooldown")]
    pub rate_limit_cooldown: u64,

    /// Per-request timeout for page fetches (milliseconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Per-request timeout for sitemap fetches (milliseconds)
    #[serde(rename = "sitemap-timeout")]
    pub sitemap_timeout: u64,

    /// Emit a progress line every N completed pages
    #[serde(rename = "progress-interval")]
    pub progress_interval: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 100,
            request_delay: 20,
            rate_limit_cooldown: 5_000,
            request_timeout: 30_000,
            sitemap_timeout: 30_000,
            progress_interval: 100,
        }
    }
}

impl FetcherConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_millis(self.rate_limit_cooldown)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    pub fn sitemap_timeout(&self) -> Duration {
        Duration::from_millis(self.sitemap_timeout)
    }
}

/// Local link extraction behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Number of rendering contexts per batch
    #[serde(rename = "max-concurrent-renders")]
    pub max_concurrent_renders: u32,

    /// Time a page gets to load and run its scripts (milliseconds)
    #[serde(rename = "render-timeout")]
    pub render_timeout: u64,

    /// Emit a progress line every N completed pages
    #[serde(rename = "progress-interval")]
    pub progress_interval: u64,

    /// Chrome/Chromium binary; autodetected when unset
    #[serde(rename = "chrome-executable")]
    pub chrome_executable: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_renders: 20,
            render_timeout: 5_000,
            progress_interval: 100,
            chrome_executable: None,
        }
    }
}

impl ExtractorConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "fedlex-mirror".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        let base = format!("{}/{}", self.crawler_name, self.crawler_version);
        let contact: Vec<String> = self
            .contact_url
            .iter()
            .map(|url| format!("+{}", url))
            .chain(self.contact_email.iter().cloned())
            .collect();

        if contact.is_empty() {
            base
        } else {
            format!("{} ({})", base, contact.join("; "))
        }
    }
}

/// Locations of the mirror and its ledgers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory of the mirrored pages
    #[serde(rename = "mirror-dir")]
    pub mirror_dir: PathBuf,

    /// Cache of resolved page URLs
    #[serde(rename = "urls-cache")]
    pub urls_cache: PathBuf,

    /// Ledger of fetched URLs
    #[serde(rename = "fetch-progress")]
    pub fetch_progress: PathBuf,

    /// Ledger of link-extracted URLs
    #[serde(rename = "extract-progress")]
    pub extract_progress: PathBuf,

    /// Tab-separated edge ledger
    pub edges: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mirror_dir: PathBuf::from("mirror"),
            urls_cache: PathBuf::from("urls.txt"),
            fetch_progress: PathBuf::from("progress.txt"),
            extract_progress: PathBuf::from("links-progress.txt"),
            edges: PathBuf::from("edges.tsv"),
        }
    }
}

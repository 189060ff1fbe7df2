use crate::config::SiteConfig;
use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use fedlex_mirror::url::extract_domain;
///
/// let url = Url::parse("https://WWW.FEDLEX.ADMIN.CH/de/home").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.fedlex.admin.ch".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether `host` is `domain` itself or one of its subdomains
pub fn is_same_or_subdomain(host: &str, domain: &str) -> bool {
    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

/// Boundaries of the mirrored site
///
/// Edges are kept when their target is in-domain (the configured domain or
/// any subdomain). Fetch follow-ups are stricter and must hit one of the
/// allowed hosts exactly.
#[derive(Debug, Clone)]
pub struct SiteScope {
    domain: String,
    allowed_hosts: Vec<String>,
    follow_extensions: Vec<String>,
}

impl SiteScope {
    pub fn new(
        domain: impl Into<String>,
        allowed_hosts: Vec<String>,
        follow_extensions: Vec<String>,
    ) -> Self {
        Self {
            domain: domain.into().to_lowercase(),
            allowed_hosts: allowed_hosts.into_iter().map(|h| h.to_lowercase()).collect(),
            follow_extensions: follow_extensions
                .into_iter()
                .map(|e| format!(".{}", e.to_lowercase()))
                .collect(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            config.domain.clone(),
            config.allowed_hosts.clone(),
            config.follow_extensions.clone(),
        )
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns true if the URL's host belongs to the site's domain
    pub fn is_in_domain(&self, url: &Url) -> bool {
        extract_domain(url)
            .map(|host| is_same_or_subdomain(&host, &self.domain))
            .unwrap_or(false)
    }

    /// Returns true if the fetcher may request this URL
    pub fn is_allowed_host(&self, url: &Url) -> bool {
        extract_domain(url)
            .map(|host| self.allowed_hosts.iter().any(|allowed| *allowed == host))
            .unwrap_or(false)
    }

    /// Returns true if the URL names a document that should be fetched
    /// alongside the sitemap pages (PDF and XML by default)
    pub fn is_followed_document(&self, url: &Url) -> bool {
        let path = url.path().to_lowercase();
        self.follow_extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }
}

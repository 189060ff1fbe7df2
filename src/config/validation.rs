use crate::config::types::{
    Config, ExtractorConfig, FetcherConfig, OutputConfig, SiteConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_extractor_config(&config.extractor)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the mirrored site description
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_domain_string(&config.domain)?;

    if config.allowed_hosts.is_empty() {
        return Err(ConfigError::Validation(
            "allowed_hosts must list at least one host".to_string(),
        ));
    }
    for host in &config.allowed_hosts {
        validate_domain_string(host)?;
    }

    if config.sitemaps.is_empty() {
        return Err(ConfigError::Validation(
            "at least one sitemap URL is required".to_string(),
        ));
    }
    for sitemap in &config.sitemaps {
        let url = Url::parse(sitemap).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid sitemap URL '{}': {}", sitemap, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Sitemap URL '{}' must use HTTP or HTTPS",
                sitemap
            )));
        }
    }

    for ext in &config.follow_extensions {
        if ext.is_empty() || ext.contains('.') || ext.contains('/') {
            return Err(ConfigError::Validation(format!(
                "follow extension '{}' must be a bare extension such as 'pdf'",
                ext
            )));
        }
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 500 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 500, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.request_timeout < 100 || config.sitemap_timeout < 100 {
        return Err(ConfigError::Validation(format!(
            "request and sitemap timeouts must be >= 100ms, got {}ms / {}ms",
            config.request_timeout, config.sitemap_timeout
        )));
    }

    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(
            "fetcher progress_interval must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates extractor configuration
fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_renders < 1 || config.max_concurrent_renders > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_renders must be between 1 and 100, got {}",
            config.max_concurrent_renders
        )));
    }

    if config.render_timeout < 100 {
        return Err(ConfigError::Validation(format!(
            "render_timeout must be >= 100ms, got {}ms",
            config.render_timeout
        )));
    }

    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(
            "extractor progress_interval must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    let paths = [
        ("mirror_dir", &config.mirror_dir),
        ("urls_cache", &config.urls_cache),
        ("fetch_progress", &config.fetch_progress),
        ("extract_progress", &config.extract_progress),
        ("edges", &config.edges),
    ];

    for (name, path) in paths {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.fetch_progress == config.extract_progress {
        return Err(ConfigError::Validation(
            "fetch_progress and extract_progress must be different files".to_string(),
        ));
    }

    Ok(())
}

/// Validates a domain or host name
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    // Check for invalid characters
    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    // Check that it doesn't start or end with a dot or hyphen
    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    // Check for consecutive dots
    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // Must contain at least one dot (e.g., example.com, not just "example")
    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

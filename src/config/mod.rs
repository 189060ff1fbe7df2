//! Configuration module for Fedlex-Mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a built-in default, so a config file is only needed to
//! point the mirror at another site or to tune concurrency.
//!
//! # Example
//!
//! ```no_run
//! use fedlex_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Fetching with {} workers", config.fetcher.max_concurrent_requests);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ExtractorConfig, FetcherConfig, OutputConfig, SiteConfig, UserAgentConfig,
    DEFAULT_SITEMAPS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;

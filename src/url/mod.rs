//! URL handling module for Fedlex-Mirror
//!
//! This module provides the URL→mirror-file mapping shared by the fetcher
//! and the extractor, link resolution, and the in-domain / allow-list
//! checks that bound the crawl.

mod domain;
mod links;
mod mapper;

pub use domain::{extract_domain, is_same_or_subdomain, SiteScope};
pub use links::resolve_link;
pub use mapper::{relative_path, PathMapper, INDEX_FILE};

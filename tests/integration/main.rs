//! Integration tests for the fetch and extract pipelines
//!
//! These tests use wiremock to create mock HTTP servers and tempfile
//! directories for the mirror and ledgers.

mod fetch_tests;
mod sitemap_tests;

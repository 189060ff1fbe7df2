//! Statistics generation from the ledgers
//!
//! This module provides functionality for extracting and displaying
//! mirror statistics from the URL cache, the two progress ledgers and the
//! edge ledger.

use crate::config::OutputConfig;
use crate::ledger::{parse_edge, read_lines, ProgressLedger};
use crate::sitemap::load_cache;
use crate::url::PathMapper;
use crate::Result;
use std::collections::HashSet;

/// Mirror statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorStatistics {
    /// URLs in the sitemap cache (0 if not resolved yet)
    pub cached_urls: u64,

    /// Distinct URLs in the fetch ledger
    pub fetched: u64,

    /// Fetched URLs whose mirror file exists
    pub fetched_on_disk: u64,

    /// Distinct URLs in the extract ledger
    pub extracted: u64,

    /// Lines in the edge ledger
    pub edge_lines: u64,

    /// Distinct (source, target) pairs
    pub unique_edges: u64,

    /// Distinct edge sources
    pub linking_pages: u64,

    /// Edge ledger lines that are not `source<TAB>target`
    pub malformed_edges: u64,
}

/// Loads statistics from the files named in the output config
pub fn load_statistics(output: &OutputConfig) -> Result<MirrorStatistics> {
    let cached_urls = load_cache(&output.urls_cache)?.map_or(0, |urls| urls.len() as u64);

    let fetched = ProgressLedger::load(&output.fetch_progress)?;
    let mapper = PathMapper::new(&output.mirror_dir);
    let fetched_on_disk = fetched
        .iter()
        .filter(|url| mapper.map(url).is_file())
        .count() as u64;

    let extracted = ProgressLedger::load(&output.extract_progress)?.len() as u64;

    let mut stats = MirrorStatistics {
        cached_urls,
        fetched: fetched.len() as u64,
        fetched_on_disk,
        extracted,
        ..Default::default()
    };

    let mut unique = HashSet::new();
    let mut sources = HashSet::new();
    for line in read_lines(&output.edges)? {
        stats.edge_lines += 1;
        match parse_edge(&line) {
            Some((source, target)) => {
                sources.insert(source.to_string());
                unique.insert((source.to_string(), target.to_string()));
            }
            None => stats.malformed_edges += 1,
        }
    }
    stats.unique_edges = unique.len() as u64;
    stats.linking_pages = sources.len() as u64;

    Ok(stats)
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &MirrorStatistics) {
    println!("=== Mirror Statistics ===\n");

    println!("Fetch:");
    println!("  Cached sitemap URLs: {}", stats.cached_urls);
    println!(
        "  Fetched: {} ({:.1}% of cached)",
        stats.fetched,
        percentage(stats.fetched, stats.cached_urls)
    );
    println!(
        "  Mirror files present: {} ({:.1}% of fetched)",
        stats.fetched_on_disk,
        percentage(stats.fetched_on_disk, stats.fetched)
    );
    println!();

    println!("Extract:");
    println!(
        "  Extracted: {} ({:.1}% of mirror files)",
        stats.extracted,
        percentage(stats.extracted, stats.fetched_on_disk)
    );
    println!();

    println!("Edges:");
    println!("  Ledger lines: {}", stats.edge_lines);
    println!("  Unique edges: {}", stats.unique_edges);
    println!("  Pages with outgoing links: {}", stats.linking_pages);
    if stats.malformed_edges > 0 {
        println!("  Malformed lines: {}", stats.malformed_edges);
    }
}

//! Output module for progress reporting and mirror statistics
//!
//! This module handles:
//! - Periodic progress lines while a pool runs
//! - Statistics over the ledgers for the `stats` command

mod progress;
pub mod stats;

pub use progress::{format_eta, ProgressReporter};
pub use stats::{load_statistics, print_statistics, MirrorStatistics};

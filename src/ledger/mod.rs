//! Append-only, line-oriented ledgers
//!
//! This module holds the durable logs both subsystems resume from:
//! - `ProgressLedger`: one completed URL per line, mirrored by an in-memory set
//! - `EdgeLedger`: one `source<TAB>target` pair per line
//!
//! Every append writes a complete line with a single `write_all` on a file
//! opened in append mode while holding the ledger's mutex, so concurrent
//! workers never interleave partial lines.

mod edges;
mod progress;

pub use edges::{parse_edge, EdgeLedger};
pub use progress::ProgressLedger;

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading or appending to a ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Failed to open ledger {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to append to ledger {path}: {source}")]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid ledger entry: {0:?}")]
    InvalidEntry(String),

    #[error("Ledger lock poisoned: {0}")]
    Poisoned(PathBuf),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Reads every non-empty line of a ledger file, in file order
///
/// A missing file yields an empty list.
pub fn read_lines(path: &Path) -> LedgerResult<Vec<String>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(LedgerError::Open {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| LedgerError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let trimmed = line.trim_end_matches('\r');
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    Ok(lines)
}

/// Opens a ledger for appending, creating it and its parent directory
///
/// If the file does not end with a newline (a line cut short outside this
/// process), one is written first so the next entry starts on its own line.
pub(crate) fn open_append(path: &Path) -> LedgerResult<File> {
    let open_err = |source| LedgerError::Open {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(open_err)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .read(true)
        .open(path)
        .map_err(open_err)?;

    let len = file.metadata().map_err(open_err)?.len();
    if len > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1)).map_err(open_err)?;
        file.read_exact(&mut last).map_err(open_err)?;
        if last[0] != b'\n' {
            tracing::warn!(
                "Ledger {} ends with an incomplete line, terminating it",
                path.display()
            );
            file.write_all(b"\n").map_err(open_err)?;
        }
    }

    Ok(file)
}

/// Rejects entries that would break the line (or column) structure
pub(crate) fn check_entry(entry: &str) -> LedgerResult<()> {
    if entry.is_empty() || entry.contains(['\n', '\r', '\t']) {
        return Err(LedgerError::InvalidEntry(entry.to_string()));
    }
    Ok(())
}

use super::{check_entry, open_append, LedgerError, LedgerResult};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Append-only record of discovered links
///
/// Each line is `source<TAB>target`. Lines are neither sorted nor
/// deduplicated; both worker pools append to the same file.
pub struct EdgeLedger {
    path: PathBuf,
    file: Mutex<File>,
    appended: AtomicU64,
}

impl EdgeLedger {
    /// Opens (or creates) the edge ledger for appending
    pub fn open(path: &Path) -> LedgerResult<Self> {
        let file = open_append(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            appended: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of edges appended during this run
    pub fn appended(&self) -> u64 {
        self.appended.load(Ordering::Relaxed)
    }

    /// Appends one edge; the complete line is written before returning
    pub fn append(&self, source: &str, target: &str) -> LedgerResult<()> {
        check_entry(source)?;
        check_entry(target)?;

        let line = format!("{}\t{}\n", source, target);
        let mut file = self
            .file
            .lock()
            .map_err(|_| LedgerError::Poisoned(self.path.clone()))?;

        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| LedgerError::Append {
                path: self.path.clone(),
                source,
            })?;

        self.appended.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Splits an edge ledger line into `(source, target)`
pub fn parse_edge(line: &str) -> Option<(&str, &str)> {
    let (source, target) = line.split_once('\t')?;
    if source.is_empty() || target.is_empty() || target.contains('\t') {
        return None;
    }
    Some((source, target))
}

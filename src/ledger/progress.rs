use super::{check_entry, open_append, read_lines, LedgerError, LedgerResult};
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Append-only record of completed URLs
///
/// The completed set is rebuilt from the file at open time and kept in
/// memory for the rest of the run. Set membership and the file append are
/// updated under the same lock, so a URL is written at most once per run
/// even when several workers finish it concurrently.
pub struct ProgressLedger {
    path: PathBuf,
    inner: Mutex<LedgerState>,
    appended: AtomicU64,
}

struct LedgerState {
    file: File,
    completed: HashSet<String>,
}

impl ProgressLedger {
    /// Opens (or creates) a progress ledger and loads its completed set
    pub fn open(path: &Path) -> LedgerResult<Self> {
        let completed: HashSet<String> = read_lines(path)?.into_iter().collect();
        let file = open_append(path)?;

        tracing::info!(
            "Loaded {} completed URLs from {}",
            completed.len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(LedgerState { file, completed }),
            appended: AtomicU64::new(0),
        })
    }

    /// Loads the completed URLs of a ledger without opening it for writing
    ///
    /// Entries are returned in first-seen file order with duplicates removed.
    pub fn load(path: &Path) -> LedgerResult<Vec<String>> {
        let mut seen = HashSet::new();
        Ok(read_lines(path)?
            .into_iter()
            .filter(|url| seen.insert(url.clone()))
            .collect())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if `url` has already been completed
    pub fn contains(&self, url: &str) -> bool {
        self.state().completed.contains(url)
    }

    /// Number of completed URLs, including those loaded at startup
    pub fn len(&self) -> usize {
        self.state().completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lines appended during this run
    pub fn appended(&self) -> u64 {
        self.appended.load(Ordering::Relaxed)
    }

    /// Records `url` as completed
    ///
    /// Returns `Ok(false)` without touching the file if the URL was already
    /// recorded. The line is written before the call returns.
    pub fn record(&self, url: &str) -> LedgerResult<bool> {
        check_entry(url)?;

        let mut state = self
            .inner
            .lock()
            .map_err(|_| LedgerError::Poisoned(self.path.clone()))?;

        if state.completed.contains(url) {
            return Ok(false);
        }

        let line = format!("{}\n", url);
        let file = &mut state.file;
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| LedgerError::Append {
                path: self.path.clone(),
                source,
            })?;

        state.completed.insert(url.to_string());
        self.appended.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        // Readers only look at the set; a poisoned lock still holds a valid one
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

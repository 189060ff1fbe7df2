use std::path::{Path, PathBuf};

/// File name used for URLs that name a directory rather than a file
pub const INDEX_FILE: &str = "index.html";

/// Maps page URLs to files under the mirror root
///
/// The fetcher writes through this mapping and the extractor reads through
/// it, so both must share this one implementation. The mapping is pure and
/// performs no I/O.
///
/// Query strings are escaped lossily: `?` and `&` both become `_`, and no
/// other character is touched, so distinct URLs can land on the same file.
#[derive(Debug, Clone)]
pub struct PathMapper {
    root: PathBuf,
}

impl PathMapper {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the mirror file for `url`, prefixed with the mirror root
    ///
    /// # Examples
    ///
    /// ```
    /// use fedlex_mirror::url::PathMapper;
    /// use std::path::Path;
    ///
    /// let mapper = PathMapper::new("mirror");
    /// assert_eq!(
    ///     mapper.map("https://www.fedlex.admin.ch/de/home"),
    ///     Path::new("mirror/www.fedlex.admin.ch/de/home/index.html")
    /// );
    /// ```
    pub fn map(&self, url: &str) -> PathBuf {
        self.root.join(relative_path(url))
    }
}

/// Computes the path of `url` relative to the mirror root
///
/// 1. Strip the `http://` or `https://` prefix
/// 2. Replace every `?` and `&` with `_`
/// 3. Append `index.html` when the path ends in `/` or its last segment
///    has no extension
///
/// Empty and `.` segments are dropped and `..` removes the previous
/// segment, so the result never escapes the mirror root.
pub fn relative_path(url: &str) -> PathBuf {
    let stripped = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let sanitized = stripped.replace(['?', '&'], "_");

    let mut segments: Vec<&str> = Vec::new();
    for segment in sanitized.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                // The host segment is never popped
                if segments.len() > 1 {
                    segments.pop();
                }
            }
            other => segments.push(other),
        }
    }

    let needs_index = sanitized.ends_with('/')
        || segments.len() < 2
        || segments
            .last()
            .map(|last| !last.contains('.'))
            .unwrap_or(true);

    let mut path: PathBuf = segments.iter().collect();
    if needs_index {
        path.push(INDEX_FILE);
    }
    path
}

use std::io::Write;
use std::path::Path;

/// Loads a cached URL list
///
/// Returns `None` if the cache is missing or holds no URLs, in which case
/// the sitemaps have to be resolved again.
pub fn load_cache(path: &Path) -> std::io::Result<Option<Vec<String>>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if urls.is_empty() {
        Ok(None)
    } else {
        Ok(Some(urls))
    }
}

/// Writes the URL list, one per line, replacing any previous cache
///
/// The list goes to a sibling temp file first and is renamed into place,
/// so an interrupted write never leaves a truncated cache behind.
pub fn store_cache(path: &Path, urls: &[String]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    let mut file = std::fs::File::create(tmp_path)?;
    for url in urls {
        writeln!(file, "{}", url)?;
    }
    file.sync_all()?;
    drop(file);

    std::fs::rename(tmp_path, path)
}

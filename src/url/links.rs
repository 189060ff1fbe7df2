use url::Url;

/// Resolves an anchor href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - empty and fragment-only hrefs (same page anchors)
/// - javascript:, mailto:, tel: and data: schemes
/// - hrefs that do not parse against the base
/// - non-HTTP(S) URLs after resolution
///
/// The fragment of the resolved URL is removed, so `/x` and `/x#part`
/// resolve to the same target.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url)
}

//! HTML parser for extracting anchors from fetched pages
//!
//! Hrefs are returned raw; resolving them against the page URL (and
//! filtering them) is left to `crate::url::resolve_link`.

use scraper::{Html, Selector};
use url::Url;

/// Hrefs of a fetched HTML page, with the URL they resolve against
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Effective base: `<base href>` if present, otherwise the page URL
    pub base: Url,

    /// Raw href attribute of every `<a href>`, in document order
    pub hrefs: Vec<String>,
}

/// Parses HTML content and extracts the anchors' hrefs
///
/// # Example
///
/// ```no_run
/// use fedlex_mirror::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/de/cc">Link</a></body></html>"#;
/// let page_url = Url::parse("https://www.fedlex.admin.ch/de/home").unwrap();
/// let parsed = parse_html(html, &page_url);
/// assert_eq!(parsed.hrefs, vec!["/de/cc".to_string()]);
/// ```
pub fn parse_html(html: &str, page_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        base: document_base(page_url, base_href(&document).as_deref()),
        hrefs: anchor_hrefs(&document),
    }
}

/// Extracts the raw href of every anchor in the document
pub fn anchor_hrefs(document: &Html) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .map(String::from)
        .collect()
}

/// Raw href of the document's first `<base href>` element
pub fn base_href(document: &Html) -> Option<String> {
    let base_selector = Selector::parse("base[href]").ok()?;

    document
        .select(&base_selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .map(String::from)
}

/// Returns the URL relative links resolve against
///
/// The first `<base href>` wins, itself resolved against the page URL.
pub fn document_base(page_url: &Url, base_href: Option<&str>) -> Url {
    base_href
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

use crate::crawler::document_base;
use crate::render::PageAnchors;
use crate::url::{resolve_link, SiteScope};
use std::collections::HashSet;
use url::Url;

/// Turns the raw hrefs of a rendered page into its edge targets
///
/// Hrefs resolve against the page's canonical URL, not the mirror file it
/// was rendered from, or against its `<base href>` resolved the same way.
/// Targets outside the domain, the page itself and repeats are dropped;
/// first-seen order is kept.
pub fn page_targets(source: &Url, anchors: &PageAnchors, scope: &SiteScope) -> Vec<Url> {
    let base = document_base(source, anchors.base_href.as_deref());
    let mut seen = HashSet::new();
    anchors
        .hrefs
        .iter()
        .filter_map(|href| resolve_link(href, &base))
        .filter(|target| target != source && scope.is_in_domain(target))
        .filter(|target| seen.insert(target.as_str().to_string()))
        .collect()
}

//! Parse sitemap and sitemap index documents.

use quick_xml::events::Event;
use quick_xml::Reader;

/// A parsed sitemap document
///
/// The shape is decided by the root element, in one pass, rather than by
/// the URL the document was fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: locations of child sitemaps
    Index(Vec<String>),
    /// `<urlset>`: locations of pages
    Leaf(Vec<String>),
    /// Malformed XML or an unknown root element
    Unparseable(String),
}

impl SitemapDocument {
    pub fn is_unparseable(&self) -> bool {
        matches!(self, Self::Unparseable(_))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Shape {
    Index,
    Leaf,
}

impl Shape {
    fn entry_tag(self) -> &'static [u8] {
        match self {
            Self::Index => b"sitemap",
            Self::Leaf => b"url",
        }
    }
}

/// Parses a sitemap XML string
///
/// Namespaces are ignored; only local names are matched. Each `<loc>` that
/// sits inside a `<sitemap>` (index) or `<url>` (leaf) entry is collected,
/// trimmed, in document order. Any XML error makes the whole document
/// unparseable.
pub fn parse_sitemap(xml: &str) -> SitemapDocument {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut shape: Option<Shape> = None;
    let mut locations = Vec::new();
    let mut in_entry = false;
    let mut in_loc = false;
    let mut current_loc = String::new();

    loop {
        buf.clear();
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                return SitemapDocument::Unparseable(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
        };

        match event {
            Event::Start(e) | Event::Empty(e) if shape.is_none() => {
                shape = match e.local_name().as_ref() {
                    b"sitemapindex" => Some(Shape::Index),
                    b"urlset" => Some(Shape::Leaf),
                    other => {
                        return SitemapDocument::Unparseable(format!(
                            "unexpected root element <{}>",
                            String::from_utf8_lossy(other)
                        ))
                    }
                };
            }
            Event::Start(e) => {
                let Some(shape) = shape else { continue };
                let name = e.local_name();
                if name.as_ref() == shape.entry_tag() {
                    in_entry = true;
                } else if in_entry && name.as_ref() == b"loc" {
                    in_loc = true;
                    current_loc.clear();
                }
            }
            Event::End(e) => {
                let Some(shape) = shape else { continue };
                let name = e.local_name();
                if name.as_ref() == shape.entry_tag() {
                    in_entry = false;
                } else if in_loc && name.as_ref() == b"loc" {
                    in_loc = false;
                    let loc = current_loc.trim();
                    if !loc.is_empty() {
                        locations.push(loc.to_string());
                    }
                }
            }
            Event::Text(e) if in_loc => match e.unescape() {
                Ok(text) => current_loc.push_str(&text),
                Err(e) => {
                    return SitemapDocument::Unparseable(format!("bad text in <loc>: {}", e))
                }
            },
            Event::CData(e) if in_loc => {
                current_loc.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match shape {
        Some(Shape::Index) => SitemapDocument::Index(locations),
        Some(Shape::Leaf) => SitemapDocument::Leaf(locations),
        None => SitemapDocument::Unparseable("document has no root element".to_string()),
    }
}

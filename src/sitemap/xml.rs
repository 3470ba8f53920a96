//! XML helpers shared by sitemap documents.

use anyhow::{Result, anyhow, bail};
use quick_xml::{Reader, events::Event};
use std::borrow::Cow;

/// XML namespace for sitemap
pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// XML declaration heading every document
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Escape special XML characters.
pub fn escape(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Minimal error document returned for unknown sitemap targets.
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <error>
///   <message>Sitemap not found</message>
///   <code>404</code>
/// </error>
/// ```
pub fn error_document(message: &str) -> String {
    format!(
        "{XML_DECLARATION}\n<error>\n  <message>{}</message>\n  <code>404</code>\n</error>\n",
        escape(message)
    )
}

/// Check that `xml` is a single well-formed document and return its root
/// element name. `urlset` and `sitemapindex` roots must carry the sitemap
/// namespace.
pub fn validate(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut root: Option<String> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| anyhow!("malformed XML at byte {}: {e}", reader.buffer_position()))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if depth == 0 {
                    if root.is_some() {
                        bail!("more than one root element");
                    }
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    if matches!(name.as_str(), "urlset" | "sitemapindex") {
                        let xmlns = e
                            .try_get_attribute("xmlns")
                            .map_err(|e| anyhow!("bad attribute on <{name}>: {e}"))?
                            .map(|attr| attr.value.into_owned());
                        if xmlns.as_deref() != Some(SITEMAP_NS.as_bytes()) {
                            bail!("<{name}> is missing the sitemap namespace");
                        }
                    }
                    root = Some(name);
                }
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(ref t) if depth == 0 => {
                if !t.iter().all(u8::is_ascii_whitespace) {
                    bail!("text outside the root element");
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        bail!("unclosed element at end of document");
    }
    root.ok_or_else(|| anyhow!("document has no root element"))
}

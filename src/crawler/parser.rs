//! HTML parser for extracting links
//!
//! This module handles decoding fetched pages and pulling every anchor out of
//! them. Hrefs are returned raw; resolving them against the page URL is done
//! by the fetch task.

use scraper::{Html, Selector};
use std::string::FromUtf8Error;
use thiserror::Error;

/// Errors that can occur while turning a page body into links
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Page {url} has no readable UTF-8 text: {source}")]
    Encoding {
        url: String,
        #[source]
        source: FromUtf8Error,
    },
}

/// An anchor as it appears in the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLink {
    /// The `href` attribute, untouched
    pub href: String,
    /// Inner HTML of the anchor
    pub text: String,
    /// Outer HTML of the anchor
    pub markup: String,
}

/// Pulls anchors out of an HTML document
pub trait LinkExtractor: Send + Sync {
    fn extract_links(&self, html: &str) -> Vec<RawLink>;
}

/// Link extractor built on `scraper`
///
/// Every `<a href>` in the document is returned in document order, including
/// duplicates; deduplication happens in the frontier.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, html: &str) -> Vec<RawLink> {
        let document = Html::parse_document(html);
        let mut links = Vec::new();

        if let Ok(a_selector) = Selector::parse("a[href]") {
            for element in document.select(&a_selector) {
                if let Some(href) = element.value().attr("href") {
                    links.push(RawLink {
                        href: href.to_string(),
                        text: element.inner_html(),
                        markup: element.html(),
                    });
                }
            }
        }

        links
    }
}

/// Decodes a page body as UTF-8
///
/// Invalid sequences are replaced with U+FFFD so the anchors around them are
/// still found. A body with nothing left but replacement characters and
/// whitespace is an error.
pub fn decode_html(url: &str, body: Vec<u8>) -> Result<String, ParseError> {
    let source = match String::from_utf8(body) {
        Ok(html) => return Ok(html),
        Err(e) => e,
    };

    let html = String::from_utf8_lossy(source.as_bytes());
    if html
        .chars()
        .all(|c| c == char::REPLACEMENT_CHARACTER || c.is_whitespace())
    {
        return Err(ParseError::Encoding {
            url: url.to_string(),
            source,
        });
    }

    tracing::debug!(
        "Replaced invalid UTF-8 in {} (first bad byte at {})",
        url,
        source.utf8_error().valid_up_to()
    );
    Ok(html.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Vec<RawLink> {
        HtmlLinkExtractor.extract_links(html)
    }

    #[test]
    fn test_extract_href_text_and_markup() {
        let links = extract(r#"<html><body><a href="/b" class="x">Bee</a></body></html>"#);

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "/b");
        assert_eq!(links[0].text, "Bee");
        assert!(links[0].markup.starts_with("<a"));
        assert!(links[0].markup.contains("href=\"/b\""));
        assert!(links[0].markup.ends_with("</a>"));
    }

    #[test]
    fn test_inner_html_is_kept() {
        let links = extract(r#"<a href="/b"><b>bold</b> text</a>"#);
        assert_eq!(links[0].text, "<b>bold</b> text");
    }

    #[test]
    fn test_anchor_without_href_skipped() {
        let links = extract(r#"<a name="top">Top</a><a href="/x">X</a>"#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "/x");
    }

    #[test]
    fn test_document_order_and_duplicates() {
        let links = extract(
            r#"
            <body>
                <a href="/2">two</a>
                <a href="/1">one</a>
                <a href="/2">again</a>
            </body>
            "#,
        );

        let hrefs: Vec<_> = links.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(hrefs, vec!["/2", "/1", "/2"]);
    }

    #[test]
    fn test_hrefs_are_not_filtered_here() {
        let links = extract(r##"<a href="mailto:a@b.test">m</a><a href="#top">t</a>"##);
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_malformed_html_is_tolerated() {
        let links = extract(r#"<div><a href="/ok">ok<p>unclosed"#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "/ok");
    }

    #[test]
    fn test_decode_html() {
        assert_eq!(decode_html("http://x.test/", b"<p>hi</p>".to_vec()).unwrap(), "<p>hi</p>");

        let err = decode_html("http://x.test/", vec![0xff, b' ', 0xfe]).unwrap_err();
        assert!(matches!(err, ParseError::Encoding { .. }));
    }

    #[test]
    fn test_decode_html_replaces_invalid_bytes() {
        let html = decode_html("http://x.test/", b"<p>caf\xE9</p><a href=\"/b\">B</a>".to_vec())
            .unwrap();

        assert_eq!(html, "<p>caf\u{FFFD}</p><a href=\"/b\">B</a>");
        let links = extract(&html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "/b");
    }
}

//! HTML link extraction
//!
//! The crawler only needs raw anchor hrefs out of a page; resolution and
//! filtering happen later, one link at a time, so a single bad href never
//! costs the rest of the page.

use crate::ExtractError;
use scraper::{Html, Selector};

/// Capability that turns a fetched body into raw href strings
pub trait LinkExtractor: Send + Sync {
    /// Returns every anchor href in the document, verbatim
    fn extract(&self, body: &[u8]) -> Result<Vec<String>, ExtractError>;
}

/// Link extractor for HTML documents, selecting `a[href]`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, body: &[u8]) -> Result<Vec<String>, ExtractError> {
        let html = std::str::from_utf8(body)?;
        extract_hrefs(html)
    }
}

/// Extracts raw anchor hrefs from an HTML string, in document order
///
/// Hrefs are not trimmed, resolved or deduplicated; an anchor appearing
/// twice yields its href twice.
///
/// # Example
///
/// ```
/// use ripple_crawl::crawler::extract_hrefs;
///
/// let hrefs = extract_hrefs(r#"<a href="/a">A</a><a name="x">X</a><a href="b.html">B</a>"#).unwrap();
/// assert_eq!(hrefs, vec!["/a", "b.html"]);
/// ```
pub fn extract_hrefs(html: &str) -> Result<Vec<String>, ExtractError> {
    let selector = Selector::parse("a[href]")
        .map_err(|e| ExtractError::Malformed(format!("invalid selector: {:?}", e)))?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect())
}

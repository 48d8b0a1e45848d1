use crate::url::{extract_domain, SessionRoot};
use crate::UrlError;
use url::{ParseError, Url};

/// Parses a seed address into an absolute URL
///
/// Seeds without an `http://` or `https://` prefix are taken as plain
/// `http://` addresses, so `example.com/` and `http://example.com/` are the
/// same seed.
///
/// # Examples
///
/// ```
/// use ripple_crawl::url::parse_seed;
///
/// let url = parse_seed("example.com/start").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/start");
/// ```
pub fn parse_seed(seed: &str) -> Result<Url, UrlError> {
    let seed = seed.trim();
    if seed.is_empty() {
        return Err(UrlError::Empty);
    }

    let lower = seed.to_ascii_lowercase();
    let url = if lower.starts_with("http://") || lower.starts_with("https://") {
        Url::parse(seed)?
    } else {
        Url::parse(&format!("http://{}", seed))?
    };

    ensure_crawlable(url)
}

/// Resolves a discovered href into a crawl target for this session
///
/// Absolute hrefs are kept as they are. Relative hrefs (including
/// scheme-relative `//host/path`) are resolved against the session root,
/// which supplies the scheme and the host. No further canonicalization
/// happens: fragments, case in the path and trailing slashes all survive.
///
/// # Errors
///
/// * `UrlError::Empty` - the href is blank
/// * `UrlError::Parse` - the href cannot be parsed
/// * `UrlError::InvalidScheme` - the href is not http(s), e.g. `mailto:`
pub fn resolve_target(href: &str, root: &SessionRoot) -> Result<Url, UrlError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(UrlError::Empty);
    }

    let url = match Url::parse(href) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => root.base().join(href)?,
        Err(e) => return Err(e.into()),
    };

    ensure_crawlable(url)
}

fn ensure_crawlable(url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if extract_domain(&url).map_or(true, |d| d.is_empty()) {
        return Err(UrlError::MissingDomain);
    }
    Ok(url)
}

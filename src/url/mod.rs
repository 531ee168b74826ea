//! URL handling module for Roundcrawl
//!
//! This module resolves hrefs found on a page into absolute links, derives
//! download file names, and provides the glob matcher used by wildcard filters.
//! Beyond absolute/relative resolution no normalization is applied: an absolute
//! href is kept exactly as written, so two spellings of one URL are two links.

mod domain;
mod matcher;

use url::Url;

// Re-export main functions
pub use domain::extract_authority;
pub use matcher::matches_wildcard;

/// File name used when a URL has no final path segment
pub const FALLBACK_FILE_NAME: &str = "index";

/// Schemes that are never fetched
const NON_HTTP_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:", "ftp:", "file:"];

/// Resolves an href found on a page into an absolute link
///
/// Returns None if the href should not enter the frontier:
/// - empty or single-character hrefs
/// - fragment-only hrefs (same page anchors)
/// - non-HTTP schemes (`javascript:`, `mailto:`, `tel:`, `data:`, ...)
///
/// Resolution rules:
/// - absolute `http`/`https` hrefs are kept verbatim
/// - `//host/path` takes the `http:` scheme
/// - `/path` is rebuilt as `http://<authority>/path` from the page's authority
/// - any other relative href is joined onto the page URL
///
/// # Examples
///
/// ```
/// use roundcrawl::url::resolve_link;
/// use url::Url;
///
/// let page = Url::parse("http://x.test/dir/a").unwrap();
/// assert_eq!(resolve_link("/b", &page).as_deref(), Some("http://x.test/b"));
/// assert_eq!(resolve_link("c.html", &page).as_deref(), Some("http://x.test/dir/c.html"));
/// assert_eq!(resolve_link("c", &page), None);
/// assert_eq!(resolve_link("#top", &page), None);
/// ```
pub fn resolve_link(href: &str, page: &Url) -> Option<String> {
    let href = href.trim();

    if href.chars().count() <= 1 || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if NON_HTTP_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return None;
    }

    if let Some(rest) = href.strip_prefix("//") {
        return accept_http(format!("http://{}", rest));
    }

    if href.starts_with('/') {
        let authority = extract_authority(page)?;
        return accept_http(format!("http://{}{}", authority, href));
    }

    match Url::parse(href) {
        Ok(url) if is_http(&url) => Some(href.to_string()),
        Ok(_) => None,
        Err(url::ParseError::RelativeUrlWithoutBase) => page
            .join(href)
            .ok()
            .filter(is_http)
            .map(|url| url.to_string()),
        Err(_) => None,
    }
}

/// Derives the file name a download is saved under
///
/// Uses the final non-empty path segment of the URL; the query string is not
/// part of the name. URLs without a usable segment fall back to
/// [`FALLBACK_FILE_NAME`].
///
/// # Examples
///
/// ```
/// use roundcrawl::url::file_name_from_url;
///
/// assert_eq!(file_name_from_url("http://x.test/f.zip"), "f.zip");
/// assert_eq!(file_name_from_url("http://x.test/dir/a.mp3?x=1"), "a.mp3");
/// assert_eq!(file_name_from_url("http://x.test/"), "index");
/// ```
pub fn file_name_from_url(link: &str) -> String {
    let from_path = match Url::parse(link) {
        Ok(url) => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string),
        Err(_) => link
            .rsplit('/')
            .next()
            .map(|s| s.split(['?', '#']).next().unwrap_or_default().to_string()),
    };

    match from_path {
        Some(name) if !name.is_empty() && name != "." && name != ".." => name,
        _ => FALLBACK_FILE_NAME.to_string(),
    }
}

fn accept_http(candidate: String) -> Option<String> {
    Url::parse(&candidate)
        .ok()
        .filter(is_http)
        .map(|_| candidate)
}

fn is_http(url: &Url) -> bool {
    url.scheme() == "http" || url.scheme() == "https"
}

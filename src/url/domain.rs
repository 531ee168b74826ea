use url::Url;

/// Extracts the authority (host plus explicit port) from a URL
///
/// Root-relative links found on a page are rebuilt against this authority, so
/// a non-default port has to survive.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use roundcrawl::url::extract_authority;
///
/// let url = Url::parse("http://x.test/a").unwrap();
/// assert_eq!(extract_authority(&url), Some("x.test".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/a").unwrap();
/// assert_eq!(extract_authority(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

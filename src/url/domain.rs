use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use article_harvest::url::extract_domain;
///
/// let url = Url::parse("https://www.business-standard.com/markets").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.business-standard.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if the URL's host equals `host`, ignoring case and port
pub fn is_host(url: &Url, host: &str) -> bool {
    url.host_str()
        .map(|h| h.eq_ignore_ascii_case(host))
        .unwrap_or(false)
}

/// Returns the site root (`scheme://host[:port]/`) of a URL
pub fn site_root(url: &Url) -> Url {
    let mut root = url.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    root
}

use crate::UrlError;
use url::Url;

/// Either an already parsed URL or a raw string from configuration or HTML
///
/// Resolved once with [`UrlLike::resolve`]; everything past that point works
/// with a canonical [`Url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlLike {
    Parsed(Url),
    Raw(String),
}

impl UrlLike {
    /// Resolves into a canonical absolute URL
    ///
    /// Raw strings are parsed; both forms are then normalized with
    /// the same canonicalization.
    pub fn resolve(self) -> Result<Url, UrlError> {
        let url = match self {
            Self::Parsed(url) => url,
            Self::Raw(raw) => Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?,
        };
        canonicalize(url)
    }
}

impl From<Url> for UrlLike {
    fn from(url: Url) -> Self {
        Self::Parsed(url)
    }
}

impl From<&str> for UrlLike {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

impl From<String> for UrlLike {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

/// Normalizes a URL string into the form used as a visited-set key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything but http and https
/// 3. Require a host
/// 4. Remove the fragment (everything after #)
///
/// Host case is already folded by the parser. Path, query and the `www.`
/// prefix are left alone: the article shape and the target host depend on
/// them.
///
/// # Examples
///
/// ```
/// use article_harvest::url::normalize_url;
///
/// let url = normalize_url("https://WWW.Example.com/markets#top").unwrap();
/// assert_eq!(url.as_str(), "https://www.example.com/markets");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    UrlLike::from(url_str).resolve()
}

fn canonicalize(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Resolves a link href against the page it appeared on
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links (same page anchors)
/// - hrefs that do not resolve to an http(s) URL
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let joined = base_url.join(href).ok()?;
    UrlLike::Parsed(joined).resolve().ok()
}

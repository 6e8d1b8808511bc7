use crate::UrlError;
use url::Url;

/// Normalizes a URL into its canonical form
///
/// Two URLs that normalize identically are the same page everywhere in the
/// crate: frontier membership and the storage uniqueness key are both the
/// canonical string.
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than http/https
/// 3. Lowercase the scheme and host
/// 4. Strip default ports (80 for http, 443 for https)
/// 5. Collapse `.` and `..` path segments; empty path becomes `/`
/// 6. Remove the fragment
///
/// # Examples
///
/// ```
/// use kumo::url::normalize_url;
///
/// let url = normalize_url("HTTP://Example.com/a/../b#frag").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/b");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    // The url crate lowercases the scheme during parsing; the host is
    // lowered explicitly to cover hosts set from percent-encoded input.
    let host = match url.host_str() {
        Some(h) => h.to_lowercase(),
        None => return Err(UrlError::MissingHost),
    };
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    match (url.scheme(), url.port()) {
        ("http", Some(80)) | ("https", Some(443)) => {
            url.set_port(None)
                .map_err(|_| UrlError::Malformed("Failed to clear default port".to_string()))?;
        }
        _ => {}
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    Ok(url)
}

/// Collapses `.`/`..` segments and duplicate slashes in a URL path
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let trailing_slash = path.len() > 1 && path.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            // Empty segments (from duplicate slashes) and current-directory markers
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut result = format!("/{}", segments.join("/"));
    if trailing_slash {
        result.push('/');
    }
    result
}

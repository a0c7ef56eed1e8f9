//! URL normalization helpers.
//!
//! Canonical URLs are the identity key for bookmark lookup and remote-import
//! dedupe. Canonicalization is tolerant: input that does not parse as a URL is
//! returned trimmed but otherwise unchanged.

use url::Url;

/// Default ports for the schemes a bookmark is likely to point at.
fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "gemini" => Some(1965),
        "spartan" => Some(300),
        "gopher" => Some(70),
        "finger" => Some(79),
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// Normalizes a URL: lowercases scheme and host, strips the scheme's default
/// port, and uses `/` as the path when both path and query are empty.
pub fn canonical_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => return trimmed.to_string(),
    };
    if url.cannot_be_a_base() {
        return url.to_string();
    }
    if let Some(host) = url.host_str() {
        let lower = host.to_lowercase();
        if lower != host {
            let _ = url.set_host(Some(&lower));
        }
    }
    if let Some(port) = url.port() {
        if default_port(url.scheme()) == Some(port) {
            let _ = url.set_port(None);
        }
    }
    if url.has_host() && url.path().is_empty() && url.query().is_none() {
        url.set_path("/");
    }
    url.to_string()
}

/// Resolves `link` against `base`. Absolute links are returned as-is;
/// unresolvable input falls back to the link text.
pub fn absolute_url(base: &str, link: &str) -> String {
    if let Ok(url) = Url::parse(link) {
        return url.to_string();
    }
    Url::parse(base)
        .and_then(|b| b.join(link))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| link.to_string())
}

/// Returns the `scheme://host[:port]` prefix of a URL, or "" when the URL
/// has no authority part.
pub fn url_root(url: &str) -> &str {
    let Some(sep) = url.find("://") else {
        return "";
    };
    let authority_start = sep + 3;
    let end = url[authority_start..]
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .map(|i| authority_start + i)
        .unwrap_or(url.len());
    &url[..end]
}

/// Host name of a URL, or "" when it has none.
pub fn url_host(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Lowercased scheme of a URL.
pub fn url_scheme(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|u| u.scheme().to_string())
}

use url::{ParseError, Url};

/// Resolves a link scraped from a page against the page URL.
///
/// Absolute links (with a scheme or a host) are returned unchanged. A link
/// starting with `/` is attached to the base host; any other relative link is
/// appended to the base path. Input that cannot be parsed is returned as is.
pub fn resolve(base_url: &str, link: &str) -> String {
    match Url::parse(link) {
        Ok(_) => return link.to_string(),
        Err(ParseError::RelativeUrlWithoutBase) => {}
        Err(_) => return link.to_string(),
    }

    // Protocol-relative links already carry a host.
    if link.starts_with("//") {
        return link.to_string();
    }

    let base = match Url::parse(base_url) {
        Ok(base) if base.has_host() => base,
        _ => return link.to_string(),
    };

    let path = if link.starts_with('/') {
        link.to_string()
    } else if base.path().ends_with('/') {
        format!("{}{}", base.path(), link)
    } else {
        format!("{}/{}", base.path(), link)
    };

    match base.join(&path) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => link.to_string(),
    }
}

//! Registrable-domain normalization.
//!
//! This is deliberately not a public-suffix computation: the authority is
//! taken as-is with a single leading `www.` label removed.

use url::Url;

/// Normalize a URL (or bare host) to the unit of same-site comparison.
///
/// Returns an empty string when no host can be parsed.
pub fn registrable_domain(url: &str) -> String {
    let Some(parsed) = parse_lenient(url) else {
        return String::new();
    };
    let Some(host) = parsed.host_str() else {
        return String::new();
    };

    let host = host.strip_prefix("www.").unwrap_or(host);
    match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Whether `request_url` belongs to a different registrable domain than `page_url`.
pub fn is_third_party(request_url: &str, page_url: &str) -> bool {
    let request = registrable_domain(request_url);
    !request.is_empty() && request != registrable_domain(page_url)
}

/// Whether a cookie's domain attribute belongs to the given registrable domain.
///
/// Cookie domains may carry a leading dot and may be a parent or child of
/// the page host; either direction counts as first-party.
pub fn cookie_belongs_to(cookie_domain: &str, page_domain: &str) -> bool {
    let cookie = cookie_domain.trim_start_matches('.');
    let cookie = cookie.strip_prefix("www.").unwrap_or(cookie).to_lowercase();
    // Cookies never carry ports.
    let page = page_domain
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(page_domain)
        .to_lowercase();

    if cookie.is_empty() || page.is_empty() {
        return false;
    }
    cookie == page || cookie.ends_with(&format!(".{page}")) || page.ends_with(&format!(".{cookie}"))
}

fn parse_lenient(url: &str) -> Option<Url> {
    let trimmed = url.trim();
    match Url::parse(trimmed) {
        Ok(u) if u.host_str().is_some() => Some(u),
        _ if !trimmed.contains("://") && !trimmed.is_empty() => {
            Url::parse(&format!("https://{trimmed}")).ok()
        }
        _ => None,
    }
}

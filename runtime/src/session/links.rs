//! Internal-link discovery from rendered HTML.

use crate::tracking::registrable_domain;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static ANCHOR: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("a[href]").ok());

/// Links found on one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    pub url: String,
    /// Every distinct http(s) link, fragments stripped, in document order.
    pub all_links: Vec<String>,
    /// Links on the page's registrable domain.
    pub first_party_links: Vec<String>,
    /// First-party links other than the page itself, capped.
    pub internal_links: Vec<String>,
}

/// Extract links from `html`, resolving relative hrefs against `page_url`.
///
/// Fragment-only hrefs, the page itself, and its trailing-slash variant are
/// never internal links. At most `limit` internal links are kept.
pub fn extract_links(html: &str, page_url: &str, limit: usize) -> PageLinks {
    extract_links_at(html, page_url, page_url, limit)
}

/// Like `extract_links` for a page that was requested as `requested_url`
/// but ended up at `final_url` after redirects.
///
/// Hrefs resolve against `final_url`. First-party still means the
/// registrable domain of `requested_url`, and neither URL is an internal
/// link of itself.
pub fn extract_links_at(html: &str, requested_url: &str, final_url: &str, limit: usize) -> PageLinks {
    let mut links = PageLinks {
        url: final_url.to_string(),
        ..Default::default()
    };
    let (Ok(base), Some(anchor)) = (Url::parse(final_url), ANCHOR.as_ref()) else {
        return links;
    };

    let page_domain = registrable_domain(requested_url);
    let mut self_keys = vec![without_fragment(&base)];
    if let Ok(requested) = Url::parse(requested_url) {
        self_keys.push(without_fragment(&requested));
    }
    let is_self = |link: &str| {
        self_keys
            .iter()
            .any(|key| key.trim_end_matches('/') == link.trim_end_matches('/'))
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    for href in document.select(anchor).filter_map(|el| el.value().attr("href")) {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        let link = without_fragment(&resolved);
        if !seen.insert(link.clone()) {
            continue;
        }

        links.all_links.push(link.clone());
        if registrable_domain(&link) != page_domain {
            continue;
        }
        links.first_party_links.push(link.clone());

        if !is_self(&link) && links.internal_links.len() < limit {
            links.internal_links.push(link);
        }
    }

    links
}

fn without_fragment(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

//! Rule-based tracker classification for request URLs.

use crate::tracking::rules::{TrackerRules, DEFAULT_RULES};
use serde::Serialize;
use url::Url;

/// Which rule fired for a tracking URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerRule {
    KnownDomain,
    PathKeyword,
    QueryParameter,
    AdSubdomain,
}

/// Classify a URL against the default rule set.
pub fn is_tracking(url: &str) -> bool {
    DEFAULT_RULES.is_tracking(url)
}

impl TrackerRules {
    /// Whether the URL matches any tracking rule. Parse failures are non-tracking.
    pub fn is_tracking(&self, url: &str) -> bool {
        self.classify(url).is_some()
    }

    /// The first rule the URL satisfies, in evaluation order.
    pub fn classify(&self, url: &str) -> Option<TrackerRule> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str().unwrap_or("").to_lowercase();

        if !host.is_empty() && self.tracker_domains.iter().any(|d| host.contains(d.as_str())) {
            return Some(TrackerRule::KnownDomain);
        }

        let path = parsed.path().to_lowercase();
        if self.path_keywords.iter().any(|k| path.contains(k.as_str())) {
            return Some(TrackerRule::PathKeyword);
        }

        if let Some(query) = parsed.query() {
            let hit = query.split('&').any(|pair| {
                let key = pair.split('=').next().unwrap_or("").to_lowercase();
                !key.is_empty() && self.query_prefixes.iter().any(|p| key.starts_with(p.as_str()))
            });
            if hit {
                return Some(TrackerRule::QueryParameter);
            }
        }

        if !host.is_empty() && self.has_ad_label(&host) {
            return Some(TrackerRule::AdSubdomain);
        }

        None
    }

    /// `"{token}."` must start a dot-delimited label of the host.
    ///
    /// This is deliberately narrower than a plain substring test on the
    /// host: `ads.example` and `cdn.ads.example` match the `ads` token, but
    /// `roads.example` and `downloads.example` do not.
    fn has_ad_label(&self, host: &str) -> bool {
        self.ad_subdomain_tokens.iter().any(|token| {
            let needle = format!("{token}.");
            host.starts_with(&needle) || host.contains(&format!(".{needle}"))
        })
    }
}

//! Static tracker rule sets.
//!
//! Loaded once at process start and never mutated. The classifier borrows
//! them; callers that need a custom set build their own `TrackerRules`.

use std::sync::LazyLock;

/// Hosts that are tracking/advertising infrastructure. Matched as substrings
/// of the request authority.
const TRACKER_DOMAINS: &[&str] = &[
    "doubleclick.net",
    "google-analytics.com",
    "googletagmanager.com",
    "googlesyndication.com",
    "googleadservices.com",
    "adservice.google.com",
    "facebook.net",
    "connect.facebook.com",
    "scorecardresearch.com",
    "quantserve.com",
    "quantcount.com",
    "criteo.com",
    "criteo.net",
    "taboola.com",
    "outbrain.com",
    "hotjar.com",
    "hotjar.io",
    "mixpanel.com",
    "segment.io",
    "segment.com",
    "amplitude.com",
    "adnxs.com",
    "rubiconproject.com",
    "pubmatic.com",
    "openx.net",
    "casalemedia.com",
    "moatads.com",
    "adsrvr.org",
    "bat.bing.com",
    "clarity.ms",
    "demdex.net",
    "omtrdc.net",
    "krxd.net",
    "bluekai.com",
    "chartbeat.com",
    "chartbeat.net",
    "addthis.com",
    "sharethis.com",
    "analytics.tiktok.com",
    "ads-twitter.com",
    "analytics.twitter.com",
    "snap.licdn.com",
    "mc.yandex.ru",
    "newrelic.com",
    "nr-data.net",
];

/// Lower-cased path fragments that indicate a beacon or collector endpoint.
const PATH_KEYWORDS: &[&str] = &[
    "/collect",
    "/pixel",
    "/beacon",
    "/track",
    "/analytics",
    "/gtag",
    "/gtm.js",
    "/pagead",
    "/impression",
    "/telemetry",
];

/// Query keys starting with any of these mark a tracking request.
const QUERY_PREFIXES: &[&str] = &[
    "utm_", "fbclid", "gclid", "dclid", "msclkid", "mc_eid", "_ga", "_gl", "yclid", "igshid",
    "mkt_tok",
];

/// Host labels typical of ad/measurement subdomains.
const AD_SUBDOMAIN_TOKENS: &[&str] = &[
    "ad",
    "ads",
    "adservice",
    "adserver",
    "adsystem",
    "adtech",
    "pagead",
    "track",
    "tracking",
    "analytics",
    "pixel",
    "metrics",
    "telemetry",
];

/// Default rules shared by every classifier call that does not bring its own.
pub static DEFAULT_RULES: LazyLock<TrackerRules> = LazyLock::new(TrackerRules::default);

/// Immutable rule sets consulted by the tracker classifier.
#[derive(Debug, Clone)]
pub struct TrackerRules {
    pub tracker_domains: Vec<String>,
    pub path_keywords: Vec<String>,
    pub query_prefixes: Vec<String>,
    pub ad_subdomain_tokens: Vec<String>,
}

impl TrackerRules {
    /// Build a rule set from explicit lists. Entries are lower-cased.
    pub fn new<S: AsRef<str>>(
        tracker_domains: &[S],
        path_keywords: &[S],
        query_prefixes: &[S],
        ad_subdomain_tokens: &[S],
    ) -> Self {
        fn lower<S: AsRef<str>>(items: &[S]) -> Vec<String> {
            items.iter().map(|s| s.as_ref().to_lowercase()).collect()
        }
        Self {
            tracker_domains: lower(tracker_domains),
            path_keywords: lower(path_keywords),
            query_prefixes: lower(query_prefixes),
            ad_subdomain_tokens: lower(ad_subdomain_tokens),
        }
    }

    /// Total number of rules across all four sets.
    pub fn len(&self) -> usize {
        self.tracker_domains.len()
            + self.path_keywords.len()
            + self.query_prefixes.len()
            + self.ad_subdomain_tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TrackerRules {
    fn default() -> Self {
        Self::new(
            TRACKER_DOMAINS,
            PATH_KEYWORDS,
            QUERY_PREFIXES,
            AD_SUBDOMAIN_TOKENS,
        )
    }
}

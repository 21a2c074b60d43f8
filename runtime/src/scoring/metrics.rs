//! Per-site aggregation of page observations.

use crate::session::PageObservation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Site-level measurements derived from its successful pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteMetrics {
    pub third_party_count: usize,
    pub tracking_count: usize,
    pub cookie_count: usize,
    pub has_banner: bool,
    pub pre_consent_cookie_count: usize,
    /// Pages that contributed (error pages excluded).
    pub pages_measured: usize,
    pub pages_failed: usize,
}

/// Combine a site's pages. Error pages are skipped; domains are unioned,
/// cookies summed, and the first non-zero pre-consent count wins.
pub fn aggregate(pages: &[PageObservation]) -> SiteMetrics {
    let mut third_party: BTreeSet<&str> = BTreeSet::new();
    let mut tracking: BTreeSet<&str> = BTreeSet::new();
    let mut metrics = SiteMetrics::default();

    for page in pages {
        if page.is_error() {
            metrics.pages_failed += 1;
            continue;
        }
        metrics.pages_measured += 1;
        third_party.extend(page.third_party_domains.iter().map(String::as_str));
        tracking.extend(page.tracking_domains.iter().map(String::as_str));
        metrics.cookie_count += page.cookie_count;
        metrics.has_banner |= page.consent_result.indicates_banner();
        if metrics.pre_consent_cookie_count == 0 {
            metrics.pre_consent_cookie_count = page.pre_consent_cookie_count;
        }
    }

    metrics.third_party_count = third_party.len();
    metrics.tracking_count = tracking.len();
    metrics
}

//! Weighted privacy score.
//!
//! Each component is a clamped linear decay from 100 at zero to 0 at its
//! reference maximum. The composite is the fixed weighted sum below.

use crate::scoring::metrics::SiteMetrics;
use serde::{Deserialize, Serialize};

pub const MAX_THIRD_PARTY: f64 = 220.0;
pub const MAX_COOKIES: f64 = 600.0;
pub const MAX_TRACKING: f64 = 50.0;
pub const MAX_PRE_CONSENT: f64 = 75.0;

pub const BANNER_PRESENT: f64 = 80.0;
pub const BANNER_ABSENT: f64 = 20.0;

pub const WEIGHT_THIRD_PARTY: f64 = 0.20;
pub const WEIGHT_COOKIE: f64 = 0.20;
pub const WEIGHT_BANNER: f64 = 0.20;
pub const WEIGHT_TRACKING: f64 = 0.25;
pub const WEIGHT_PRE_CONSENT: f64 = 0.15;

/// Component scores in [0, 100] and their weighted composite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub third_party: f64,
    pub cookie: f64,
    pub banner: f64,
    pub tracking: f64,
    pub pre_consent: f64,
    pub composite: f64,
}

/// Score a site's metrics.
pub fn score(metrics: &SiteMetrics) -> ScoreBreakdown {
    let third_party = decay(metrics.third_party_count, MAX_THIRD_PARTY);
    let cookie = decay(metrics.cookie_count, MAX_COOKIES);
    let banner = if metrics.has_banner { BANNER_PRESENT } else { BANNER_ABSENT };
    let tracking = decay(metrics.tracking_count, MAX_TRACKING);
    // Cookies with no banner at all is the worst case, whatever was counted.
    let pre_consent = if !metrics.has_banner && metrics.cookie_count > 0 {
        0.0
    } else {
        decay(metrics.pre_consent_cookie_count, MAX_PRE_CONSENT)
    };

    let composite = WEIGHT_THIRD_PARTY * third_party
        + WEIGHT_COOKIE * cookie
        + WEIGHT_BANNER * banner
        + WEIGHT_TRACKING * tracking
        + WEIGHT_PRE_CONSENT * pre_consent;

    ScoreBreakdown {
        third_party,
        cookie,
        banner,
        tracking,
        pre_consent,
        composite,
    }
}

fn decay(count: usize, max: f64) -> f64 {
    (100.0 - count as f64 / max * 100.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(tp: usize, cookies: usize, banner: bool, tracking: usize, pre: usize) -> SiteMetrics {
        SiteMetrics {
            third_party_count: tp,
            tracking_count: tracking,
            cookie_count: cookies,
            has_banner: banner,
            pre_consent_cookie_count: pre,
            ..Default::default()
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_clean_site_without_banner() {
        let s = score(&metrics(0, 0, false, 0, 0));
        assert_eq!((s.third_party, s.cookie, s.banner, s.tracking, s.pre_consent), (100.0, 100.0, 20.0, 100.0, 100.0));
        assert!(close(s.composite, 84.0), "{}", s.composite);
    }

    #[test]
    fn test_composite_is_the_weighted_sum() {
        let s = score(&metrics(17, 90, true, 6, 9));
        let sum = WEIGHT_THIRD_PARTY * s.third_party
            + WEIGHT_COOKIE * s.cookie
            + WEIGHT_BANNER * s.banner
            + WEIGHT_TRACKING * s.tracking
            + WEIGHT_PRE_CONSENT * s.pre_consent;
        assert!(close(s.composite, sum));
        assert!(close(WEIGHT_THIRD_PARTY + WEIGHT_COOKIE + WEIGHT_BANNER + WEIGHT_TRACKING + WEIGHT_PRE_CONSENT, 1.0));
    }

    #[test]
    fn test_saturated_site_without_banner() {
        let s = score(&metrics(220, 600, false, 50, 10));
        assert_eq!((s.third_party, s.cookie, s.banner, s.tracking, s.pre_consent), (0.0, 0.0, 20.0, 0.0, 0.0));
        assert!(close(s.composite, 4.0), "{}", s.composite);
    }

    #[test]
    fn test_components_clamp_at_zero() {
        let s = score(&metrics(10_000, 10_000, true, 10_000, 10_000));
        assert_eq!(s.third_party, 0.0);
        assert_eq!(s.cookie, 0.0);
        assert_eq!(s.tracking, 0.0);
        assert_eq!(s.pre_consent, 0.0);
        assert!(close(s.composite, 16.0));
    }

    #[test]
    fn test_linear_midpoints() {
        let s = score(&metrics(110, 300, true, 25, 15));
        assert!(close(s.third_party, 50.0));
        assert!(close(s.cookie, 50.0));
        assert!(close(s.tracking, 50.0));
        assert!(close(s.pre_consent, 80.0));
        assert!(close(s.composite, 0.2 * 50.0 + 0.2 * 50.0 + 0.2 * 80.0 + 0.25 * 50.0 + 0.15 * 80.0));
    }

    #[test]
    fn test_monotone_in_each_count() {
        for banner in [false, true] {
            for step in 0..300 {
                let base = score(&metrics(step, step, banner, step / 4, step / 3)).composite;
                let more_tp = score(&metrics(step + 1, step, banner, step / 4, step / 3)).composite;
                let more_cookies = score(&metrics(step, step + 1, banner, step / 4, step / 3)).composite;
                let more_tracking = score(&metrics(step, step, banner, step / 4 + 1, step / 3)).composite;
                let more_pre = score(&metrics(step, step, banner, step / 4, step / 3 + 1)).composite;
                assert!(more_tp <= base);
                assert!(more_cookies <= base);
                assert!(more_tracking <= base);
                assert!(more_pre <= base);
            }
        }
    }

    #[test]
    fn test_banner_never_lowers_score() {
        for cookies in [0, 1, 50, 700] {
            for pre in [0, 5, 100] {
                let without = score(&metrics(10, cookies, false, 3, pre)).composite;
                let with = score(&metrics(10, cookies, true, 3, pre)).composite;
                assert!(with >= without, "cookies={cookies} pre={pre}");
            }
        }
    }
}

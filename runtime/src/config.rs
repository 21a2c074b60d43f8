//! Runtime configuration for a probe run.
//!
//! Every timeout, delay, and limit lives here with a default. Values can be
//! overridden through `PRIVACY_PROBE_*` environment variables and then by
//! command-line flags.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// How the consent banner is handled on each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConsentMode {
    /// Never touch the banner.
    #[default]
    None,
    /// Try to accept the banner.
    Accept,
    /// Accepted as a value but behaves exactly like `None`.
    Reject,
}

impl ConsentMode {
    /// Whether this mode clicks anything on the page.
    pub fn interacts(self) -> bool {
        matches!(self, ConsentMode::Accept)
    }
}

/// Fixed desktop viewport applied to every browsing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Configuration shared by the orchestrator and every page session.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub consent_mode: ConsentMode,
    /// Run aggregation, scoring, and ranking after crawling.
    pub analyze: bool,
    pub viewport: Viewport,
    pub headless: bool,
    /// Bound on reaching DOM-ready.
    pub navigation_timeout: Duration,
    /// Wait after DOM-ready so early async requests fire.
    pub pre_banner_settle: Duration,
    /// Wait after banner handling before the final cookie snapshot.
    pub post_banner_settle: Duration,
    /// Bound on a single locator-strategy attempt.
    pub banner_attempt_timeout: Duration,
    /// Pixels scrolled before the second banner pass.
    pub banner_scroll_offset: u32,
    /// Wait before the third banner pass.
    pub banner_retry_delay: Duration,
    /// Pause between consecutive sites.
    pub inter_site_delay: Duration,
    pub max_sites: usize,
    pub max_internal_links: usize,
    pub output_dir: PathBuf,
    pub record_network: bool,
    pub screenshots: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            consent_mode: ConsentMode::None,
            analyze: true,
            viewport: Viewport::default(),
            headless: true,
            navigation_timeout: Duration::from_secs(30),
            pre_banner_settle: Duration::from_secs(3),
            post_banner_settle: Duration::from_secs(2),
            banner_attempt_timeout: Duration::from_millis(1500),
            banner_scroll_offset: 600,
            banner_retry_delay: Duration::from_secs(2),
            inter_site_delay: Duration::from_secs(5),
            max_sites: 10,
            max_internal_links: 2,
            output_dir: PathBuf::from("output"),
            record_network: false,
            screenshots: true,
        }
    }
}

impl CrawlConfig {
    /// Defaults overlaid with any `PRIVACY_PROBE_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = env_parse::<u64>("PRIVACY_PROBE_NAV_TIMEOUT_MS") {
            config.navigation_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("PRIVACY_PROBE_SETTLE_MS") {
            config.pre_banner_settle = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("PRIVACY_PROBE_POST_BANNER_SETTLE_MS") {
            config.post_banner_settle = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("PRIVACY_PROBE_BANNER_ATTEMPT_MS") {
            config.banner_attempt_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("PRIVACY_PROBE_SITE_DELAY_MS") {
            config.inter_site_delay = Duration::from_millis(ms);
        }
        if let Some(n) = env_parse::<usize>("PRIVACY_PROBE_MAX_SITES") {
            config.max_sites = n;
        }
        if let Some(dir) = std::env::var_os("PRIVACY_PROBE_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if std::env::var("PRIVACY_PROBE_RECORD_NETWORK").is_ok() {
            config.record_network = true;
        }
        if std::env::var("PRIVACY_PROBE_NO_SCREENSHOTS").is_ok() {
            config.screenshots = false;
        }

        config
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring {key}={raw:?}: not a valid value");
            None
        }
    }
}

//! Consent-banner handling with bounded, perturbed retries.

use crate::config::{ConsentMode, CrawlConfig};
use crate::consent::strategy::{default_strategies, scroll_script, LocatorStrategy, ScriptReport};
use crate::error::ProbeError;
use crate::renderer::RenderContext;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of banner handling for one page session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentResult {
    /// Tried every pass, nothing clickable found.
    NoBanner,
    /// A strategy found and activated its target.
    Accepted,
    /// Handling intentionally skipped.
    NoConsentMode,
    /// The session failed before handling could complete.
    Error,
}

impl ConsentResult {
    /// Counts as "the site shows a banner" for scoring.
    pub fn indicates_banner(self) -> bool {
        !matches!(self, ConsentResult::NoBanner | ConsentResult::NoConsentMode)
    }
}

/// A strategy whose target exists and was clicked, or didn't exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Clicked,
    NotFound,
}

/// Why an individual attempt failed. Never propagated past the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    Timeout,
    Script(String),
    NotActivated(String),
}

impl AttemptFailure {
    fn into_error(self, strategy: &LocatorStrategy) -> ProbeError {
        let reason = match self {
            AttemptFailure::Timeout => "timed out".to_string(),
            AttemptFailure::Script(e) => format!("script error: {e}"),
            AttemptFailure::NotActivated(e) => format!("click failed: {e}"),
        };
        ProbeError::InteractionFailure {
            strategy: strategy.name.to_string(),
            reason,
        }
    }
}

/// Page-state change applied before a retry pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perturbation {
    None,
    Scroll(u32),
    Wait(Duration),
}

/// Summary of every pass, for logging and diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BannerReport {
    pub passes: usize,
    pub failures: usize,
    pub accepted_by: Option<&'static str>,
}

/// Locates and accepts consent banners.
pub struct BannerHandler {
    strategies: Vec<LocatorStrategy>,
    attempt_timeout: Duration,
    passes: Vec<Perturbation>,
}

impl BannerHandler {
    pub fn new(strategies: Vec<LocatorStrategy>, attempt_timeout: Duration, passes: Vec<Perturbation>) -> Self {
        Self {
            strategies,
            attempt_timeout,
            passes,
        }
    }

    /// Default strategies; first pass as-is, then after a scroll, then after a wait.
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(
            default_strategies(),
            config.banner_attempt_timeout,
            vec![
                Perturbation::None,
                Perturbation::Scroll(config.banner_scroll_offset),
                Perturbation::Wait(config.banner_retry_delay),
            ],
        )
    }

    /// Run banner handling for `mode`.
    pub async fn handle(&self, ctx: &dyn RenderContext, mode: ConsentMode) -> (ConsentResult, BannerReport) {
        let mut report = BannerReport::default();

        if !mode.interacts() {
            if mode == ConsentMode::Reject {
                debug!("reject mode has no interactive behavior, skipping banner");
            }
            return (ConsentResult::NoConsentMode, report);
        }

        for perturbation in &self.passes {
            self.perturb(ctx, *perturbation).await;
            report.passes += 1;

            if let Some(strategy) = self.run_pass(ctx, &mut report).await {
                info!("consent banner accepted via {}", strategy.name);
                report.accepted_by = Some(strategy.name);
                return (ConsentResult::Accepted, report);
            }
        }

        debug!(
            "no consent banner after {} passes ({} failed attempts)",
            report.passes, report.failures
        );
        (ConsentResult::NoBanner, report)
    }

    /// One full pass over the strategy list; first success wins.
    async fn run_pass(&self, ctx: &dyn RenderContext, report: &mut BannerReport) -> Option<&LocatorStrategy> {
        for strategy in &self.strategies {
            match self.attempt(ctx, strategy).await {
                Ok(AttemptOutcome::Clicked) => return Some(strategy),
                Ok(AttemptOutcome::NotFound) => {}
                Err(failure) => {
                    report.failures += 1;
                    warn!("{}", failure.into_error(strategy));
                }
            }
        }
        None
    }

    async fn attempt(
        &self,
        ctx: &dyn RenderContext,
        strategy: &LocatorStrategy,
    ) -> Result<AttemptOutcome, AttemptFailure> {
        let script = strategy.script();
        let value = match tokio::time::timeout(self.attempt_timeout, ctx.execute_js(&script)).await {
            Err(_) => return Err(AttemptFailure::Timeout),
            Ok(Err(e)) => return Err(AttemptFailure::Script(e.to_string())),
            Ok(Ok(v)) => v,
        };

        let report: ScriptReport = serde_json::from_value(value).unwrap_or_default();
        match (report.found, report.clicked) {
            (true, true) => Ok(AttemptOutcome::Clicked),
            (true, false) => Err(AttemptFailure::NotActivated(
                report.error.unwrap_or_else(|| "target not clickable".into()),
            )),
            (false, _) => Ok(AttemptOutcome::NotFound),
        }
    }

    async fn perturb(&self, ctx: &dyn RenderContext, perturbation: Perturbation) {
        match perturbation {
            Perturbation::None => {}
            Perturbation::Scroll(offset) => {
                let script = scroll_script(offset);
                if let Err(e) = tokio::time::timeout(self.attempt_timeout, ctx.execute_js(&script))
                    .await
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("scroll timed out")))
                {
                    debug!("scroll before banner retry failed: {e}");
                }
            }
            Perturbation::Wait(delay) => tokio::time::sleep(delay).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{CookieInfo, NavigationResult, RequestListener};
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::path::Path;
    use std::sync::Mutex;

    /// Page that answers strategy scripts from a fixed table.
    struct BannerPage {
        /// Marker that must appear in the script for the banner to be "found".
        marker: Option<&'static str>,
        /// Banner only appears after this many scroll calls.
        needs_scrolls: usize,
        click_breaks: bool,
        script_errors: bool,
        scrolls: Mutex<usize>,
        scripts: Mutex<Vec<String>>,
    }

    impl BannerPage {
        fn new(marker: Option<&'static str>) -> Self {
            Self {
                marker,
                needs_scrolls: 0,
                click_breaks: false,
                script_errors: false,
                scrolls: Mutex::new(0),
                scripts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.scripts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RenderContext for BannerPage {
        async fn on_request(&mut self, _listener: RequestListener) -> Result<()> {
            Ok(())
        }
        async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
            Ok(NavigationResult { final_url: url.into(), load_time_ms: 0 })
        }
        async fn execute_js(&self, script: &str) -> Result<Value> {
            self.scripts.lock().unwrap().push(script.to_string());
            if script.starts_with("window.scrollBy") {
                *self.scrolls.lock().unwrap() += 1;
                return Ok(json!(600));
            }
            if self.script_errors {
                anyhow::bail!("Execution context was destroyed");
            }
            let visible = *self.scrolls.lock().unwrap() >= self.needs_scrolls;
            match self.marker {
                Some(marker) if visible && script.contains(marker) => {
                    if self.click_breaks {
                        Ok(json!({ "found": true, "clicked": false, "error": "detached" }))
                    } else {
                        Ok(json!({ "found": true, "clicked": true }))
                    }
                }
                _ => Ok(json!({ "found": false, "clicked": false })),
            }
        }
        async fn get_url(&self) -> Result<String> {
            Ok("https://example.com/".into())
        }
        async fn content(&self) -> Result<String> {
            Ok(String::new())
        }
        async fn cookies(&self) -> Result<Vec<CookieInfo>> {
            Ok(Vec::new())
        }
        async fn screenshot(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
        async fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    fn handler() -> BannerHandler {
        BannerHandler::from_config(&CrawlConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_accept_modes_do_not_touch_page() {
        let page = BannerPage::new(Some("onetrust-accept-btn-handler"));
        for mode in [ConsentMode::None, ConsentMode::Reject] {
            let (result, report) = handler().handle(&page, mode).await;
            assert_eq!(result, ConsentResult::NoConsentMode);
            assert_eq!(report.passes, 0);
        }
        assert_eq!(page.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_matching_strategy_accepts() {
        let page = BannerPage::new(Some("onetrust-accept-btn-handler"));
        let (result, report) = handler().handle(&page, ConsentMode::Accept).await;
        assert_eq!(result, ConsentResult::Accepted);
        assert_eq!(report.accepted_by, Some("id:onetrust"));
        assert_eq!(report.passes, 1);
        // Four text strategies, then the OneTrust id.
        assert_eq!(page.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exact_text_does_not_match_longer_label() {
        let page = BannerPage::new(Some("\"accept all\""));
        let (_, report) = handler().handle(&page, ConsentMode::Accept).await;
        assert_eq!(report.accepted_by, Some("text:accept-all"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_retry_reveals_banner() {
        let mut page = BannerPage::new(Some("didomi-notice-agree-button"));
        page.needs_scrolls = 1;
        let (result, report) = handler().handle(&page, ConsentMode::Accept).await;
        assert_eq!(result, ConsentResult::Accepted);
        assert_eq!(report.passes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_passes_report_no_banner() {
        let page = BannerPage::new(None);
        let strategies = default_strategies().len();
        let (result, report) = handler().handle(&page, ConsentMode::Accept).await;
        assert_eq!(result, ConsentResult::NoBanner);
        assert_eq!(report.passes, 3);
        assert_eq!(report.failures, 0);
        // Three full passes plus one scroll.
        assert_eq!(page.calls(), strategies * 3 + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_clicks_are_swallowed() {
        let mut page = BannerPage::new(Some("onetrust-accept-btn-handler"));
        page.click_breaks = true;
        let (result, report) = handler().handle(&page, ConsentMode::Accept).await;
        assert_eq!(result, ConsentResult::NoBanner);
        assert_eq!(report.failures, 3);

        let mut page = BannerPage::new(None);
        page.script_errors = true;
        let (result, report) = handler().handle(&page, ConsentMode::Accept).await;
        assert_eq!(result, ConsentResult::NoBanner);
        assert_eq!(report.failures, default_strategies().len() * 3);
    }

    #[test]
    fn test_banner_indication() {
        assert!(ConsentResult::Accepted.indicates_banner());
        assert!(ConsentResult::Error.indicates_banner());
        assert!(!ConsentResult::NoBanner.indicates_banner());
        assert!(!ConsentResult::NoConsentMode.indicates_banner());
    }
}

//! One page visit: navigate, settle, measure, handle the banner, collect.

use crate::config::{ConsentMode, CrawlConfig};
use crate::consent::{BannerHandler, ConsentResult};
use crate::error::ProbeError;
use crate::observe::{NetworkObserver, NetworkRecorder};
use crate::pool::{ContextHandle, PoolManager};
use crate::renderer::RenderContext;
use crate::session::artifacts::{self, ArtifactNamer, PageArtifacts, PageLabel};
use crate::session::links::{extract_links_at, PageLinks};
use crate::session::observation::PageObservation;
use crate::tracking::domain::cookie_belongs_to;
use crate::tracking::{registrable_domain, TrackerRules};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const ERROR_SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(10);

/// What a completed visit produced before observer state is merged in.
struct Visit {
    consent: ConsentResult,
    cookie_count: usize,
    pre_consent_cookie_count: usize,
    links: PageLinks,
    artifacts: PageArtifacts,
}

/// Runs page sessions against the shared context pool.
pub struct PageCrawler<'a> {
    pool: &'a PoolManager,
    rules: Arc<TrackerRules>,
    config: &'a CrawlConfig,
    banner: BannerHandler,
}

impl<'a> PageCrawler<'a> {
    pub fn new(pool: &'a PoolManager, rules: Arc<TrackerRules>, config: &'a CrawlConfig) -> Self {
        Self {
            pool,
            rules,
            config,
            banner: BannerHandler::from_config(config),
        }
    }

    /// Visit `url` in a fresh isolated context.
    ///
    /// Never fails: any error in the visit yields an observation carrying
    /// only the URL and the error, and the context is released either way.
    pub async fn crawl_page(
        &self,
        url: &str,
        mode: ConsentMode,
        measure_pre_consent: bool,
        label: PageLabel,
        namer: Option<&ArtifactNamer>,
    ) -> PageObservation {
        let measure_pre_consent = if measure_pre_consent && mode.interacts() {
            warn!("pre-consent measurement needs a non-interactive session, skipping for {url}");
            false
        } else {
            measure_pre_consent
        };

        let started = Instant::now();
        info!("crawling {url} ({})", label.as_string());

        let mut handle = match self.pool.acquire().await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("could not open browsing context for {url}: {e}");
                return PageObservation::failed(url, label, ProbeError::Browser(e.to_string()));
            }
        };

        let recorder = match namer {
            Some(namer) if self.config.record_network => {
                match NetworkRecorder::create(&namer.network_log(label)) {
                    Ok(recorder) => Some(recorder),
                    Err(e) => {
                        warn!("network recording disabled for {url}: {e}");
                        None
                    }
                }
            }
            _ => None,
        };
        let observer = NetworkObserver::new(url, Arc::clone(&self.rules), recorder);

        let outcome = self
            .visit(&mut handle, url, mode, measure_pre_consent, label, namer, &observer)
            .await;

        let error_screenshot = match (&outcome, namer) {
            (Err(_), Some(namer)) if self.config.screenshots => {
                self.error_screenshot(&handle, namer, label).await
            }
            _ => None,
        };

        // Closing the context ends the request tap; only then finalize the log.
        if let Err(e) = self.pool.release(handle).await {
            warn!("closing browsing context for {url} failed: {e}");
        }
        let observed = observer.finish();

        match outcome {
            Ok(visit) => {
                info!(
                    "{url}: {} third-party, {} tracking, {} cookies, banner {:?} in {:.1}s",
                    observed.third_party.len(),
                    observed.tracking.len(),
                    visit.cookie_count,
                    visit.consent,
                    started.elapsed().as_secs_f64()
                );
                let mut artifacts = visit.artifacts;
                artifacts.network_log = observed.network_log;
                PageObservation {
                    url: url.to_string(),
                    label: label.as_string(),
                    consent_result: visit.consent,
                    cookie_count: visit.cookie_count,
                    third_party_domains: observed.third_party,
                    tracking_domains: observed.tracking,
                    pre_consent_cookie_count: visit.pre_consent_cookie_count,
                    internal_links: visit.links.internal_links,
                    error: None,
                    artifacts,
                }
            }
            Err(e) => {
                warn!("page session for {url} failed: {e}");
                let mut failed = PageObservation::failed(url, label, e);
                failed.artifacts.error_screenshot = error_screenshot;
                failed
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn visit(
        &self,
        handle: &mut ContextHandle,
        url: &str,
        mode: ConsentMode,
        measure_pre_consent: bool,
        label: PageLabel,
        namer: Option<&ArtifactNamer>,
        observer: &NetworkObserver,
    ) -> Result<Visit, ProbeError> {
        let ctx = handle.context_mut()?;
        let mut artifacts = PageArtifacts::default();

        ctx.on_request(observer.listener())
            .await
            .map_err(|e| ProbeError::Session(format!("attaching request listener: {e}")))?;

        let final_url = self.navigate(ctx, url).await?;
        tokio::time::sleep(self.config.pre_banner_settle).await;

        if let (Some(namer), true) = (namer, self.config.screenshots) {
            artifacts.initial_screenshot =
                artifacts::try_screenshot(ctx, namer.initial_screenshot(label)).await;
        }

        let pre_consent_cookie_count = if measure_pre_consent {
            let page_domain = registrable_domain(url);
            let cookies = ctx
                .cookies()
                .await
                .map_err(|e| ProbeError::Session(format!("reading pre-consent cookies: {e}")))?;
            let foreign = cookies
                .iter()
                .filter(|c| !cookie_belongs_to(&c.domain, &page_domain))
                .count();
            debug!("{url}: {foreign} of {} cookies set before consent are third-party", cookies.len());
            foreign
        } else {
            0
        };

        let (consent, report) = self.banner.handle(ctx, mode).await;
        if report.failures > 0 {
            debug!("{url}: {} banner attempts failed", report.failures);
        }

        tokio::time::sleep(self.config.post_banner_settle).await;

        if consent == ConsentResult::Accepted {
            if let (Some(namer), true) = (namer, self.config.screenshots) {
                artifacts.after_consent_screenshot =
                    artifacts::try_screenshot(ctx, namer.after_consent_screenshot(label)).await;
            }
        }

        let cookie_count = ctx
            .cookies()
            .await
            .map_err(|e| ProbeError::Session(format!("reading cookies: {e}")))?
            .len();

        let links = match self.discover_links(ctx, url, &final_url).await {
            Ok(links) => links,
            Err(e) => {
                warn!("{e}, continuing without links");
                PageLinks {
                    url: final_url,
                    ..Default::default()
                }
            }
        };
        if let Some(namer) = namer {
            artifacts.links_file = artifacts::try_write_links(&links, namer.links_file(label));
        }

        Ok(Visit {
            consent,
            cookie_count,
            pre_consent_cookie_count,
            links,
            artifacts,
        })
    }

    /// Load `url` and return the URL the page ended up at.
    async fn navigate(&self, ctx: &mut dyn RenderContext, url: &str) -> Result<String, ProbeError> {
        let bound = self.config.navigation_timeout;
        let timeout_ms = bound.as_millis() as u64;

        match tokio::time::timeout(bound, ctx.navigate(url, timeout_ms)).await {
            Err(_) => Err(ProbeError::NavigationTimeout {
                url: url.to_string(),
                timeout: bound,
            }),
            Ok(Err(e)) => Err(match e.downcast::<ProbeError>() {
                Ok(probe) => probe,
                Err(other) => ProbeError::Navigation {
                    url: url.to_string(),
                    reason: other.to_string(),
                },
            }),
            Ok(Ok(nav)) => {
                debug!("{url}: DOM ready in {}ms at {}", nav.load_time_ms, nav.final_url);
                if nav.final_url.is_empty() {
                    Ok(url.to_string())
                } else {
                    Ok(nav.final_url)
                }
            }
        }
    }

    async fn discover_links(
        &self,
        ctx: &dyn RenderContext,
        url: &str,
        final_url: &str,
    ) -> Result<PageLinks, ProbeError> {
        let html = ctx
            .content()
            .await
            .map_err(|e| ProbeError::ExtractionFailure(format!("reading DOM of {url}: {e}")))?;
        Ok(extract_links_at(&html, url, final_url, self.config.max_internal_links))
    }

    /// Capture whatever the failed page shows while its context is still open.
    async fn error_screenshot(
        &self,
        handle: &ContextHandle,
        namer: &ArtifactNamer,
        label: PageLabel,
    ) -> Option<PathBuf> {
        let ctx = handle.context().ok()?;
        let path = namer.error_screenshot(label);
        match tokio::time::timeout(ERROR_SCREENSHOT_TIMEOUT, artifacts::try_screenshot(ctx, path)).await {
            Ok(saved) => saved,
            Err(_) => {
                warn!("error screenshot timed out after {}s", ERROR_SCREENSHOT_TIMEOUT.as_secs());
                None
            }
        }
    }
}

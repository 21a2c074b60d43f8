//! Per-site sequencing of page sessions.
//!
//! Sites are visited one after another, pages within a site in a fixed
//! order: the homepage with the configured consent mode, a non-interactive
//! homepage pass when pre-consent cookies need their own session, then the
//! internal links found on the homepage.

use crate::config::{ConsentMode, CrawlConfig};
use crate::pool::PoolManager;
use crate::session::{ArtifactNamer, PageCrawler, PageLabel, PageObservation};
use crate::site::pacing::SitePacer;
use crate::site::record::{self, SiteRecord};
use crate::tracking::TrackerRules;
use std::sync::Arc;
use tracing::{info, warn};

/// Progress notifications emitted while a run advances.
#[derive(Debug, Clone, Copy)]
pub enum CrawlEvent<'a> {
    SiteStarted {
        index: usize,
        total: usize,
        url: &'a str,
    },
    PageFinished {
        site: &'a str,
        page: &'a PageObservation,
    },
    SiteFinished {
        index: usize,
        total: usize,
        record: &'a SiteRecord,
    },
}

/// Drives page sessions for a list of sites on one shared browser.
pub struct SiteCrawler {
    pool: Arc<PoolManager>,
    rules: Arc<TrackerRules>,
    config: CrawlConfig,
    pacer: SitePacer,
}

impl SiteCrawler {
    pub fn new(pool: Arc<PoolManager>, rules: Arc<TrackerRules>, config: CrawlConfig) -> Self {
        let pacer = SitePacer::new(config.inter_site_delay);
        Self {
            pool,
            rules,
            config,
            pacer,
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Probe every site in order. When analysis is enabled the records come
    /// back scored and ranked, otherwise in input order with zero scores.
    pub async fn run<F>(&self, sites: &[String], mut on_event: F) -> Vec<SiteRecord>
    where
        F: FnMut(CrawlEvent<'_>),
    {
        if self.config.consent_mode == ConsentMode::Reject {
            warn!("consent mode 'reject' performs no interaction and behaves like 'none'");
        }
        if let Err(e) = std::fs::create_dir_all(&self.config.output_dir) {
            warn!(
                "could not create {}: {e}, artifacts may be missing",
                self.config.output_dir.display()
            );
        }

        let total = sites.len();
        let mut records = Vec::with_capacity(total);
        for (index, site) in sites.iter().enumerate() {
            let waited = self.pacer.wait_turn().await;
            if !waited.is_zero() {
                info!("paused {:.1}s before {site}", waited.as_secs_f64());
            }

            on_event(CrawlEvent::SiteStarted { index, total, url: site });
            let record = self.crawl_site(site, &mut on_event).await;
            on_event(CrawlEvent::SiteFinished {
                index,
                total,
                record: &record,
            });
            self.pacer.site_finished().await;
            records.push(record);
        }

        if self.config.analyze {
            record::analyze_and_rank(&mut records);
        }
        records
    }

    /// Crawl one site's pages. Failing pages are recorded, never fatal.
    pub async fn crawl_site<F>(&self, site_url: &str, on_event: &mut F) -> SiteRecord
    where
        F: FnMut(CrawlEvent<'_>),
    {
        let crawler = PageCrawler::new(&self.pool, Arc::clone(&self.rules), &self.config);
        let namer = ArtifactNamer::new(&self.config.output_dir, site_url);
        let mode = self.config.consent_mode;
        let mut record = SiteRecord::new(site_url);

        let mut push = |record: &mut SiteRecord, page: PageObservation| {
            on_event(CrawlEvent::PageFinished {
                site: site_url,
                page: &page,
            });
            record.push(page);
        };

        // A non-interactive homepage pass measures pre-consent cookies itself;
        // an accepting pass needs a separate clean session for that.
        let home = crawler
            .crawl_page(site_url, mode, !mode.interacts(), PageLabel::Home, Some(&namer))
            .await;
        let mut links = home.internal_links.clone();
        let home_failed = home.is_error();
        push(&mut record, home);

        if mode.interacts() {
            let pre = crawler
                .crawl_page(site_url, ConsentMode::None, true, PageLabel::PreConsent, Some(&namer))
                .await;
            if home_failed && !pre.is_error() {
                links = pre.internal_links.clone();
            }
            push(&mut record, pre);
        }

        for (i, link) in links.iter().take(self.config.max_internal_links).enumerate() {
            let page = crawler
                .crawl_page(link, mode, false, PageLabel::Internal(i + 1), Some(&namer))
                .await;
            push(&mut record, page);
        }

        let failed = record.pages.iter().filter(|p| p.is_error()).count();
        info!(
            "{site_url}: {} pages crawled, {failed} failed",
            record.pages.len()
        );
        record
    }
}

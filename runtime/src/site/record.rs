//! Everything measured for one site.

use crate::scoring::{self, ScoreBreakdown, SiteMetrics};
use crate::session::PageObservation;
use serde::{Deserialize, Serialize};

/// A site's page observations plus, once analyzed, its metrics and score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub site_url: String,
    /// Homepage variants first, then internal pages in discovery order.
    pub pages: Vec<PageObservation>,
    pub metrics: SiteMetrics,
    pub score: ScoreBreakdown,
}

impl SiteRecord {
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            pages: Vec::new(),
            metrics: SiteMetrics::default(),
            score: ScoreBreakdown::default(),
        }
    }

    pub fn push(&mut self, page: PageObservation) {
        self.pages.push(page);
    }

    /// Derive metrics and score from the gathered pages.
    pub fn analyze(&mut self) {
        self.metrics = scoring::aggregate(&self.pages);
        self.score = scoring::score(&self.metrics);
    }

    pub fn composite(&self) -> f64 {
        self.score.composite
    }

    /// Pages that completed without error.
    pub fn measured_pages(&self) -> impl Iterator<Item = &PageObservation> {
        self.pages.iter().filter(|p| !p.is_error())
    }

    pub fn all_pages_failed(&self) -> bool {
        !self.pages.is_empty() && self.pages.iter().all(PageObservation::is_error)
    }
}

/// Analyze every record and order them best score first.
pub fn analyze_and_rank(records: &mut [SiteRecord]) {
    for record in records.iter_mut() {
        record.analyze();
    }
    scoring::rank_by(records, SiteRecord::composite);
}

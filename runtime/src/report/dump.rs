//! Full structured dump of a run.

use crate::config::ConsentMode;
use crate::site::SiteRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A site record with its position in the output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSite {
    pub rank: usize,
    #[serde(flatten)]
    pub record: SiteRecord,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub consent_mode: ConsentMode,
    /// False when scoring was skipped; sites are then in input order.
    pub analyzed: bool,
    pub sites: Vec<RankedSite>,
}

impl RunReport {
    pub fn new(records: Vec<SiteRecord>, consent_mode: ConsentMode, analyzed: bool) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            consent_mode,
            analyzed,
            sites: records
                .into_iter()
                .enumerate()
                .map(|(i, record)| RankedSite { rank: i + 1, record })
                .collect(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &SiteRecord> {
        self.sites.iter().map(|s| &s.record)
    }

    pub fn page_count(&self) -> usize {
        self.records().map(|r| r.pages.len()).sum()
    }

    pub fn failed_page_count(&self) -> usize {
        self.records()
            .flat_map(|r| r.pages.iter())
            .filter(|p| p.is_error())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{PageLabel, PageObservation};

    #[test]
    fn test_ranks_follow_order() {
        let mut down = SiteRecord::new("https://down.example");
        down.push(PageObservation::failed("https://down.example", PageLabel::Home, "boom"));
        let report = RunReport::new(
            vec![SiteRecord::new("https://a.example"), down],
            ConsentMode::Accept,
            true,
        );
        assert_eq!(report.sites[0].rank, 1);
        assert_eq!(report.sites[1].rank, 2);
        assert_eq!(report.page_count(), 1);
        assert_eq!(report.failed_page_count(), 1);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["consent_mode"], "accept");
        assert_eq!(value["sites"][1]["site_url"], "https://down.example");
        assert_eq!(value["sites"][1]["rank"], 2);
        assert!(Uuid::parse_str(value["run_id"].as_str().unwrap()).is_ok());
    }
}

//! The record produced by one page session.

use crate::consent::ConsentResult;
use crate::session::artifacts::{PageArtifacts, PageLabel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What one page visit measured. Immutable once the session returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageObservation {
    pub url: String,
    /// `home`, `preconsent`, `page1`, ...
    pub label: String,
    pub consent_result: ConsentResult,
    pub cookie_count: usize,
    pub third_party_domains: BTreeSet<String>,
    pub tracking_domains: BTreeSet<String>,
    /// Zero unless this session measured it.
    pub pre_consent_cookie_count: usize,
    pub internal_links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "PageArtifacts::is_empty")]
    pub artifacts: PageArtifacts,
}

impl PageObservation {
    /// Minimal observation for a failed session: no counts, no domains.
    pub fn failed(url: &str, label: PageLabel, error: impl ToString) -> Self {
        Self {
            url: url.to_string(),
            label: label.as_string(),
            consent_result: ConsentResult::Error,
            cookie_count: 0,
            third_party_domains: BTreeSet::new(),
            tracking_domains: BTreeSet::new(),
            pre_consent_cookie_count: 0,
            internal_links: Vec::new(),
            error: Some(error.to_string()),
            artifacts: PageArtifacts::default(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

//! Tracker classification and domain normalization.

pub mod classifier;
pub mod domain;
pub mod rules;

pub use classifier::{is_tracking, TrackerRule};
pub use domain::{is_third_party, registrable_domain};
pub use rules::TrackerRules;

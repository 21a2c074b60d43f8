//! Consent-banner location and acceptance.

pub mod handler;
pub mod strategy;

pub use handler::{AttemptFailure, AttemptOutcome, BannerHandler, BannerReport, ConsentResult, Perturbation};
pub use strategy::{default_strategies, Locator, LocatorStrategy};

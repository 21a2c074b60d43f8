//! Headless-browser privacy probe.
//!
//! Visits a short list of sites, observes third-party and tracking requests
//! per page, optionally accepts consent banners, and turns the observations
//! into a ranked per-site privacy score.

pub mod cli;
pub mod config;
pub mod consent;
pub mod error;
pub mod observe;
pub mod pool;
pub mod renderer;
pub mod report;
pub mod scoring;
pub mod session;
pub mod site;
pub mod tracking;

pub use config::{ConsentMode, CrawlConfig};
pub use error::ProbeError;
pub use site::{SiteCrawler, SiteRecord};

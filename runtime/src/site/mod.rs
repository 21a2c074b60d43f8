//! Site-level orchestration: input list, pacing, records.

pub mod list;
pub mod orchestrator;
pub mod pacing;
pub mod record;

pub use list::{read_site_list, SiteList};
pub use orchestrator::{CrawlEvent, SiteCrawler};
pub use pacing::SitePacer;
pub use record::{analyze_and_rank, SiteRecord};

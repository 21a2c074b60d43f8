//! Page crawl sessions and what they produce.

pub mod artifacts;
pub mod links;
pub mod observation;
pub mod page;

pub use artifacts::{ArtifactNamer, PageArtifacts, PageLabel};
pub use links::{extract_links, extract_links_at, PageLinks};
pub use observation::PageObservation;
pub use page::PageCrawler;

//! CLI subcommand implementations for the privacy-probe binary.

pub mod crawl_cmd;
pub mod output;
pub mod progress;

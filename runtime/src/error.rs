//! Error taxonomy for the measurement pipeline.
//!
//! Page-level failures are caught at the session boundary and recorded on the
//! observation; nothing in here aborts the site or run loop.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while probing sites.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The page did not reach DOM-ready within the navigation bound.
    #[error("navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    /// The browser rejected or aborted the navigation.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A single click/selector attempt failed. Logged, never fatal.
    #[error("interaction '{strategy}' failed: {reason}")]
    InteractionFailure { strategy: String, reason: String },

    /// DOM evaluation for links or classification threw.
    #[error("extraction failed: {0}")]
    ExtractionFailure(String),

    /// Anything else that escaped a page session.
    #[error("session error: {0}")]
    Session(String),

    /// Browser launch, context creation, or teardown failed.
    #[error("browser error: {0}")]
    Browser(String),

    /// The site list could not be read.
    #[error("failed to read site list {path}: {source}")]
    SiteList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisting results failed.
    #[error("failed to write report {path}: {reason}")]
    Report { path: PathBuf, reason: String },
}

impl ProbeError {
    /// Whether this error came from the navigation bound being exceeded.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::NavigationTimeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;

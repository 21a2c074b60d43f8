//! Browser abstraction used by page sessions.
//!
//! The measurement pipeline only talks to these traits. `chromium` is the
//! production implementation; tests drive the pipeline with scripted fakes.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub use chromium::ChromiumRenderer;

/// Callback invoked for every outgoing request URL in a context.
///
/// Must return quickly; it runs on the event-drain path and never gates the
/// request itself.
pub type RequestListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Outcome of a successful navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    pub final_url: String,
    pub load_time_ms: u64,
}

/// A cookie as seen in the context's jar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieInfo {
    pub name: String,
    pub domain: String,
}

/// One isolated browsing context (own cookies, cache, and storage).
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Register the request tap. Stays active across navigations until close.
    async fn on_request(&mut self, listener: RequestListener) -> Result<()>;

    /// Navigate and wait for DOM construction only, bounded by `timeout_ms`.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;

    /// Evaluate a script in the page and return its JSON value.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;

    /// Current page URL.
    async fn get_url(&self) -> Result<String>;

    /// Serialized rendered DOM.
    async fn content(&self) -> Result<String>;

    /// All cookies currently in this context.
    async fn cookies(&self) -> Result<Vec<CookieInfo>>;

    /// Write a viewport screenshot to `path`.
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Tear down the context and everything it owns.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Factory for isolated contexts on one shared browser process.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;

    /// Close the browser process. Contexts must already be released.
    async fn shutdown(&self) -> Result<()>;
}

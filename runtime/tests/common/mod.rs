//! Scripted in-memory browser for driving the pipeline without Chromium.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use privacy_probe::config::CrawlConfig;
use privacy_probe::renderer::{CookieInfo, NavigationResult, RenderContext, Renderer, RequestListener};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How one URL behaves when loaded.
#[derive(Debug, Clone, Default)]
pub struct PageScript {
    /// Requests fired while the page loads.
    pub requests: Vec<String>,
    /// Requests fired once the consent banner is accepted.
    pub consent_requests: Vec<String>,
    /// Cookies present from the first load.
    pub cookies: Vec<CookieInfo>,
    /// Cookies added when the banner is accepted.
    pub consent_cookies: Vec<CookieInfo>,
    /// Text a locator script must contain to find the banner button.
    pub banner_marker: Option<String>,
    pub html: String,
    /// Navigation never completes.
    pub hang: bool,
    /// Navigation fails with this message.
    pub fail: Option<String>,
    /// Where navigation ends up instead of the requested URL.
    pub redirect: Option<String>,
}

impl PageScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(mut self, urls: &[&str]) -> Self {
        self.requests = urls.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn consent_requests(mut self, urls: &[&str]) -> Self {
        self.consent_requests = urls.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn cookies(mut self, cookies: &[(&str, &str)]) -> Self {
        self.cookies = to_cookies(cookies);
        self
    }

    pub fn consent_cookies(mut self, cookies: &[(&str, &str)]) -> Self {
        self.consent_cookies = to_cookies(cookies);
        self
    }

    pub fn banner(mut self, marker: &str) -> Self {
        self.banner_marker = Some(marker.to_string());
        self
    }

    pub fn links(mut self, hrefs: &[&str]) -> Self {
        let anchors: String = hrefs.iter().map(|h| format!("<a href=\"{h}\">link</a>")).collect();
        self.html = format!("<html><body>{anchors}</body></html>");
        self
    }

    pub fn hang(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn fail(mut self, message: &str) -> Self {
        self.fail = Some(message.to_string());
        self
    }

    pub fn redirect_to(mut self, url: &str) -> Self {
        self.redirect = Some(url.to_string());
        self
    }
}

fn to_cookies(cookies: &[(&str, &str)]) -> Vec<CookieInfo> {
    cookies
        .iter()
        .map(|(name, domain)| CookieInfo {
            name: name.to_string(),
            domain: domain.to_string(),
        })
        .collect()
}

#[derive(Default)]
struct Shared {
    pages: Mutex<HashMap<String, PageScript>>,
    navigations: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    shutdowns: AtomicUsize,
}

/// Renderer whose contexts replay `PageScript`s keyed by exact URL.
#[derive(Clone, Default)]
pub struct ScriptedRenderer {
    shared: Arc<Shared>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, script: PageScript) -> Self {
        self.shared.pages.lock().unwrap().insert(url.to_string(), script);
        self
    }

    pub fn opened(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shared.shutdowns.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.shared.navigations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        self.shared.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedContext {
            shared: Arc::clone(&self.shared),
            listener: None,
            state: Mutex::new(ContextState::default()),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        self.shared.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct ContextState {
    url: String,
    script: PageScript,
    accepted: bool,
}

struct ScriptedContext {
    shared: Arc<Shared>,
    listener: Option<RequestListener>,
    state: Mutex<ContextState>,
}

impl ScriptedContext {
    fn fire(&self, urls: &[String]) {
        if let Some(listener) = &self.listener {
            for url in urls {
                listener(url.as_str());
            }
        }
    }
}

#[async_trait]
impl RenderContext for ScriptedContext {
    async fn on_request(&mut self, listener: RequestListener) -> Result<()> {
        self.listener = Some(listener);
        Ok(())
    }

    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        self.shared.navigations.lock().unwrap().push(url.to_string());
        let script = self.shared.pages.lock().unwrap().get(url).cloned();
        let Some(script) = script else {
            anyhow::bail!("net::ERR_NAME_NOT_RESOLVED");
        };
        if script.hang {
            std::future::pending::<()>().await;
        }
        if let Some(message) = &script.fail {
            anyhow::bail!("{message}");
        }

        self.fire(&script.requests);
        let final_url = script.redirect.clone().unwrap_or_else(|| url.to_string());
        let mut state = self.state.lock().unwrap();
        state.url = final_url.clone();
        state.script = script;
        Ok(NavigationResult {
            final_url,
            load_time_ms: 120,
        })
    }

    async fn execute_js(&self, script: &str) -> Result<Value> {
        if script.starts_with("window.scrollBy") {
            return Ok(json!(600));
        }
        let consent_requests = {
            let mut state = self.state.lock().unwrap();
            let hit = !state.accepted
                && state
                    .script
                    .banner_marker
                    .as_deref()
                    .is_some_and(|marker| script.contains(marker));
            if !hit {
                return Ok(json!({ "found": false, "clicked": false }));
            }
            state.accepted = true;
            state.script.consent_requests.clone()
        };
        self.fire(&consent_requests);
        Ok(json!({ "found": true, "clicked": true }))
    }

    async fn get_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().script.html.clone())
    }

    async fn cookies(&self) -> Result<Vec<CookieInfo>> {
        let state = self.state.lock().unwrap();
        let mut cookies = state.script.cookies.clone();
        if state.accepted {
            cookies.extend(state.script.consent_cookies.iter().cloned());
        }
        Ok(cookies)
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        std::fs::write(path, b"\x89PNG")?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.shared.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Default timings with output into `dir`.
pub fn test_config(dir: &Path) -> CrawlConfig {
    CrawlConfig {
        output_dir: dir.to_path_buf(),
        navigation_timeout: Duration::from_secs(30),
        ..CrawlConfig::default()
    }
}

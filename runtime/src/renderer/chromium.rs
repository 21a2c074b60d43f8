//! Chromium renderer over the DevTools protocol.

use crate::config::{CrawlConfig, Viewport};
use crate::error::ProbeError;
use crate::renderer::{CookieInfo, NavigationResult, RenderContext, Renderer, RequestListener};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::EventRequestWillBeSent;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::cdp::browser_protocol::storage::GetCookiesParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// DOM is constructed once the new document has left the `loading` state.
const DOM_READY_CHECK: &str =
    "document.readyState !== 'loading' && location.href !== 'about:blank'";

const DOM_READY_POLL: Duration = Duration::from_millis(100);

/// One Chromium process shared by every page session of a run.
pub struct ChromiumRenderer {
    browser: Arc<Mutex<Browser>>,
    handler_task: Mutex<Option<JoinHandle<()>>>,
    viewport: Viewport,
}

impl ChromiumRenderer {
    /// Launch Chromium and start draining its protocol handler.
    pub async fn launch(config: &CrawlConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport.width, config.viewport.height)
            .request_timeout(config.navigation_timeout);
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder
            .build()
            .map_err(|e| ProbeError::Browser(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ProbeError::Browser(format!("failed to launch chromium: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("chromium handler event error: {e}");
                }
            }
        });

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handler_task: Mutex::new(Some(handler_task)),
            viewport: config.viewport,
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page_and_id = {
            let mut browser = self.browser.lock().await;
            let context_id = browser
                .create_browser_context(CreateBrowserContextParams::default())
                .await
                .context("creating isolated browser context")?;
            let target = CreateTargetParams::builder()
                .url("about:blank")
                .browser_context_id(context_id.clone())
                .build()
                .map_err(|e| anyhow!("invalid target params: {e}"))?;
            let page = browser.new_page(target).await.context("opening page")?;
            (page, context_id)
        };
        let (page, context_id) = page_and_id;

        page.execute(SetDeviceMetricsOverrideParams::new(
            i64::from(self.viewport.width),
            i64::from(self.viewport.height),
            1.0,
            false,
        ))
        .await
        .context("setting viewport")?;

        debug!("opened browser context {:?}", context_id);

        Ok(Box::new(ChromiumContext {
            browser: Arc::clone(&self.browser),
            page,
            context_id,
            listener_task: None,
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        {
            let mut browser = self.browser.lock().await;
            browser.close().await.context("closing chromium")?;
            let _ = browser.wait().await;
        }
        if let Some(task) = self.handler_task.lock().await.take() {
            task.abort();
        }
        Ok(())
    }
}

/// A page inside its own incognito-style browser context.
pub struct ChromiumContext {
    browser: Arc<Mutex<Browser>>,
    page: Page,
    context_id: BrowserContextId,
    listener_task: Option<JoinHandle<()>>,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn on_request(&mut self, listener: RequestListener) -> Result<()> {
        let mut events = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .context("subscribing to request events")?;

        if let Some(previous) = self.listener_task.take() {
            previous.abort();
        }
        self.listener_task = Some(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                listener(event.request.url.as_str());
            }
        }));
        Ok(())
    }

    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let bound = Duration::from_millis(timeout_ms);
        let start = Instant::now();
        let page = &self.page;

        let wait_for_dom = async {
            let response = page.execute(NavigateParams::new(url)).await?;
            if let Some(error_text) = response.result.error_text.clone() {
                return Err(anyhow!(error_text));
            }
            loop {
                let ready = page
                    .evaluate(DOM_READY_CHECK)
                    .await
                    .ok()
                    .and_then(|r| r.into_value::<bool>().ok())
                    .unwrap_or(false);
                if ready {
                    return Ok(());
                }
                tokio::time::sleep(DOM_READY_POLL).await;
            }
        };

        match tokio::time::timeout(bound, wait_for_dom).await {
            Err(_) => Err(ProbeError::NavigationTimeout {
                url: url.to_string(),
                timeout: bound,
            }
            .into()),
            Ok(Err(e)) => Err(ProbeError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }
            .into()),
            Ok(Ok(())) => Ok(NavigationResult {
                final_url: self.get_url().await.unwrap_or_else(|_| url.to_string()),
                load_time_ms: start.elapsed().as_millis() as u64,
            }),
        }
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self.page.evaluate(script).await?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn get_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    /// Every cookie in this context's jar, third-party domains included.
    async fn cookies(&self) -> Result<Vec<CookieInfo>> {
        let params = GetCookiesParams {
            browser_context_id: Some(self.context_id.clone()),
        };
        let response = self
            .browser
            .lock()
            .await
            .execute(params)
            .await
            .context("reading the context cookie jar")?;
        Ok(response
            .result
            .cookies
            .iter()
            .map(|c| CookieInfo {
                name: c.name.clone(),
                domain: c.domain.clone(),
            })
            .collect())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.page
            .save_screenshot(ScreenshotParams::builder().build(), path)
            .await
            .with_context(|| format!("saving screenshot to {}", path.display()))?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumContext {
            browser,
            page,
            context_id,
            listener_task,
        } = *self;

        if let Some(task) = listener_task {
            task.abort();
        }
        if let Err(e) = page.close().await {
            debug!("page close failed: {e}");
        }
        browser
            .lock()
            .await
            .dispose_browser_context(context_id)
            .await
            .context("disposing browser context")?;
        Ok(())
    }
}

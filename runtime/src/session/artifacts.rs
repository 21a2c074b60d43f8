//! Deterministic per-page artifact naming and best-effort writers.

use crate::renderer::RenderContext;
use crate::session::links::PageLinks;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::warn;
use url::Url;

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]+").unwrap());

/// Which visit of a site a page session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLabel {
    Home,
    PreConsent,
    Internal(usize),
}

impl PageLabel {
    pub fn as_string(self) -> String {
        match self {
            PageLabel::Home => "home".to_string(),
            PageLabel::PreConsent => "preconsent".to_string(),
            PageLabel::Internal(n) => format!("page{n}"),
        }
    }
}

/// Files written for one page session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageArtifacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_screenshot: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_consent_screenshot: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_log: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links_file: Option<PathBuf>,
    /// Taken when the session failed, before its context closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_screenshot: Option<PathBuf>,
}

impl PageArtifacts {
    pub fn is_empty(&self) -> bool {
        self.initial_screenshot.is_none()
            && self.after_consent_screenshot.is_none()
            && self.network_log.is_none()
            && self.links_file.is_none()
            && self.error_screenshot.is_none()
    }
}

/// Names artifacts after the site's hostname.
#[derive(Debug, Clone)]
pub struct ArtifactNamer {
    dir: PathBuf,
    site_name: String,
}

impl ArtifactNamer {
    pub fn new(dir: impl Into<PathBuf>, site_url: &str) -> Self {
        Self {
            dir: dir.into(),
            site_name: site_name(site_url),
        }
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{dir}/{site}_{label}_{suffix}`
    pub fn path(&self, label: PageLabel, suffix: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}_{}", self.site_name, label.as_string(), suffix))
    }

    pub fn initial_screenshot(&self, label: PageLabel) -> PathBuf {
        self.path(label, "initial.png")
    }

    pub fn after_consent_screenshot(&self, label: PageLabel) -> PathBuf {
        self.path(label, "after_consent.png")
    }

    pub fn network_log(&self, label: PageLabel) -> PathBuf {
        self.path(label, "network.jsonl")
    }

    pub fn links_file(&self, label: PageLabel) -> PathBuf {
        self.path(label, "links.json")
    }

    pub fn error_screenshot(&self, label: PageLabel) -> PathBuf {
        self.path(label, "error.png")
    }
}

/// Hostname with every run of unsafe characters replaced by `_`.
pub fn site_name(site_url: &str) -> String {
    let host = Url::parse(site_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| {
            let rest = site_url.split("://").last().unwrap_or(site_url);
            rest.split('/').next().unwrap_or("").to_string()
        });
    let name = UNSAFE_CHARS.replace_all(&host, "_").trim_matches('_').to_string();
    if name.is_empty() {
        "site".to_string()
    } else {
        name
    }
}

/// Take a screenshot, logging instead of failing.
pub async fn try_screenshot(ctx: &dyn RenderContext, path: PathBuf) -> Option<PathBuf> {
    match ctx.screenshot(&path).await {
        Ok(()) => Some(path),
        Err(e) => {
            warn!("screenshot {} failed: {e}", path.display());
            None
        }
    }
}

/// Write the links artifact, logging instead of failing.
pub fn try_write_links(links: &PageLinks, path: PathBuf) -> Option<PathBuf> {
    let result = serde_json::to_vec_pretty(links)
        .map_err(anyhow::Error::from)
        .and_then(|bytes| {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, bytes)?;
            Ok(())
        });
    match result {
        Ok(()) => Some(path),
        Err(e) => {
            warn!("writing {} failed: {e}", path.display());
            None
        }
    }
}

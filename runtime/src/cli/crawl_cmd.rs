//! `privacy-probe crawl --site-list <file>` — probe sites and rank them.

use crate::cli::output::{self, Styled};
use crate::cli::progress::SiteProgress;
use crate::config::{ConsentMode, CrawlConfig};
use crate::pool::PoolManager;
use crate::renderer::ChromiumRenderer;
use crate::report::{self, ReportPaths, RunReport};
use crate::site::{read_site_list, CrawlEvent, SiteCrawler};
use crate::tracking::TrackerRules;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Arguments for the crawl command.
#[derive(Debug, Clone, Args)]
pub struct CrawlArgs {
    /// File with one site (hostname or URL) per line
    #[arg(long, short = 's', value_name = "FILE")]
    pub site_list: PathBuf,

    /// How consent banners are handled
    #[arg(long, value_enum, default_value_t = ConsentMode::None)]
    pub consent: ConsentMode,

    /// Aggregate, score, and rank sites (default)
    #[arg(long, overrides_with = "no_analyze")]
    pub analyze: bool,

    /// Only crawl and write page observations
    #[arg(long, overrides_with = "analyze")]
    pub no_analyze: bool,

    /// Directory for reports and per-page artifacts
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write a JSON-lines log of every request per page
    #[arg(long)]
    pub record_network: bool,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,
}

impl CrawlArgs {
    /// Layer these flags over an environment-derived config.
    pub fn apply(&self, mut config: CrawlConfig) -> CrawlConfig {
        config.consent_mode = self.consent;
        config.analyze = !self.no_analyze;
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        config.record_network |= self.record_network;
        config.headless = !self.headful;
        config
    }
}

/// Run the crawl command.
pub async fn run(args: CrawlArgs) -> Result<()> {
    let s = Styled::new();
    let start = Instant::now();
    let config = args.apply(CrawlConfig::from_env());

    let list = read_site_list(&args.site_list, config.max_sites)
        .with_context(|| format!("loading sites from {}", args.site_list.display()))?;
    if list.sites.is_empty() {
        anyhow::bail!("no sites found in {}", args.site_list.display());
    }

    if !output::is_quiet() && !output::is_json() {
        output::print_header(&s);
        if list.truncated() {
            eprintln!(
                "  {} {} entries listed, probing the first {} ({} skipped)",
                s.warn_sym(),
                list.total,
                list.sites.len(),
                list.dropped()
            );
            eprintln!();
        }
        output::print_section(&s, "Probing");
    }
    info!(
        "probing {} sites, consent mode {:?}, analysis {}",
        list.sites.len(),
        config.consent_mode,
        if config.analyze { "on" } else { "off" }
    );

    let renderer = ChromiumRenderer::launch(&config)
        .await
        .context("launching headless browser")?;
    let pool = Arc::new(PoolManager::sequential(Arc::new(renderer)));
    let crawler = SiteCrawler::new(Arc::clone(&pool), Arc::new(TrackerRules::default()), config.clone());

    let mut current: Option<SiteProgress> = None;
    let records = crawler
        .run(&list.sites, |event| match event {
            CrawlEvent::SiteStarted { index, total, url } => {
                current = Some(SiteProgress::start(index, total, url));
            }
            CrawlEvent::PageFinished { site, page } => {
                if let Some(progress) = current.as_mut() {
                    progress.page_done(site, page);
                }
            }
            CrawlEvent::SiteFinished { record, .. } => {
                if let Some(progress) = current.take() {
                    progress.finish(record);
                }
            }
        })
        .await;

    if let Err(e) = pool.shutdown().await {
        warn!("browser shutdown failed: {e}");
    }

    let report = RunReport::new(records, config.consent_mode, config.analyze);
    let paths = report::write_all(&config.output_dir, &report).context("writing reports")?;

    if output::is_json() {
        print_report_json(&report, &paths, start.elapsed().as_secs_f64());
        return Ok(());
    }
    if !output::is_quiet() {
        print_summary(&s, &report, &paths, start.elapsed().as_secs());
    }
    Ok(())
}

fn print_report_json(report: &RunReport, paths: &ReportPaths, elapsed_secs: f64) {
    let sites: Vec<serde_json::Value> = report
        .sites
        .iter()
        .map(|site| {
            serde_json::json!({
                "rank": site.rank,
                "site": site.record.site_url,
                "privacy_score": (site.record.score.composite * 100.0).round() / 100.0,
                "metrics": site.record.metrics,
                "pages": site.record.pages.len(),
            })
        })
        .collect();
    output::print_json(&serde_json::json!({
        "run_id": report.run_id,
        "analyzed": report.analyzed,
        "sites": sites,
        "pages": report.page_count(),
        "failed_pages": report.failed_page_count(),
        "results": paths.results,
        "ranking": paths.ranking,
        "elapsed_secs": elapsed_secs,
    }));
}

fn print_summary(s: &Styled, report: &RunReport, paths: &ReportPaths, elapsed_secs: u64) {
    eprintln!();
    if report.analyzed {
        output::print_section(s, "Ranking");
        eprintln!(
            "    {}",
            s.dim(&format!(
                "{:>4}  {:<40} {:>6}  {:>5} {:>5} {:>6} {:>5}  banner",
                "rank", "site", "score", "3p", "track", "cookie", "pre"
            ))
        );
        for site in &report.sites {
            let m = &site.record.metrics;
            eprintln!(
                "    {:>4}  {:<40} {}  {:>5} {:>5} {:>6} {:>5}  {}",
                site.rank,
                site.record.site_url,
                s.score(site.record.score.composite),
                m.third_party_count,
                m.tracking_count,
                m.cookie_count,
                m.pre_consent_cookie_count,
                if m.has_banner { s.green("yes") } else { s.dim("no") }
            );
        }
    } else {
        output::print_section(s, "Sites");
        for site in &report.sites {
            eprintln!("    {:>4}  {}  {} pages", site.rank, site.record.site_url, site.record.pages.len());
        }
    }

    if output::is_verbose() {
        let failed: Vec<_> = report
            .records()
            .flat_map(|r| r.pages.iter())
            .filter(|p| p.is_error())
            .collect();
        if !failed.is_empty() {
            eprintln!();
            output::print_section(s, "Failed pages");
            for page in failed {
                output::print_check(
                    s.fail_sym(),
                    &page.label,
                    &format!("{} {}", page.url, s.dim(page.error.as_deref().unwrap_or(""))),
                );
            }
        }
    }

    eprintln!();
    output::print_section(s, "Output");
    output::print_check(s.ok_sym(), "results", &paths.results.display().to_string());
    if let Some(ranking) = &paths.ranking {
        output::print_check(s.ok_sym(), "ranking", &ranking.display().to_string());
    }

    let failed = report.failed_page_count();
    let (status, sym) = if failed == 0 {
        (s.green("complete"), s.ok_sym())
    } else {
        (s.yellow("complete with failures"), s.warn_sym())
    };
    output::print_status(
        s,
        &format!("{sym} {status}"),
        &format!(
            "{} pages, {failed} failed, {}",
            report.page_count(),
            output::format_duration(elapsed_secs)
        ),
    );
}

//! Spinner display while sites are being probed.

use crate::cli::output;
use crate::session::PageObservation;
use crate::site::SiteRecord;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("  {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("\u{25b8}\u{25b9}\u{25b8}\u{25b9}\u{25b8}")
}

fn done_style() -> ProgressStyle {
    ProgressStyle::with_template("  {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// One spinner line per site, hidden in quiet or JSON mode.
pub struct SiteProgress {
    bar: Option<ProgressBar>,
    pages: usize,
}

impl SiteProgress {
    pub fn start(index: usize, total: usize, url: &str) -> Self {
        if output::is_quiet() || output::is_json() {
            return Self { bar: None, pages: 0 };
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.set_message(format!("[{}/{total}] {url:<40} \x1b[2mhomepage\x1b[0m", index + 1));
        bar.enable_steady_tick(Duration::from_millis(120));
        Self {
            bar: Some(bar),
            pages: 0,
        }
    }

    pub fn page_done(&mut self, site: &str, page: &PageObservation) {
        self.pages += 1;
        if let Some(bar) = &self.bar {
            let state = if page.is_error() { "\x1b[31mfailed\x1b[0m" } else { "done" };
            bar.set_message(format!(
                "{site:<46} \x1b[34m{} {state}, {} pages\x1b[0m",
                page.label, self.pages
            ));
        }
    }

    pub fn finish(self, record: &SiteRecord) {
        let Some(bar) = self.bar else {
            return;
        };
        bar.set_style(done_style());
        let failed = record.pages.iter().filter(|p| p.is_error()).count();
        let message = if record.all_pages_failed() {
            format!("\x1b[31m\u{2717}\x1b[0m {:<46} \x1b[31mall pages failed\x1b[0m", record.site_url)
        } else if failed > 0 {
            format!(
                "\x1b[33m\u{26a0}\x1b[0m {:<46} \x1b[33m{} pages, {failed} failed\x1b[0m",
                record.site_url,
                record.pages.len()
            )
        } else {
            format!(
                "\x1b[32m\u{2713}\x1b[0m {:<46} \x1b[32m{} pages\x1b[0m",
                record.site_url,
                record.pages.len()
            )
        };
        bar.set_message(message);
        bar.finish();
    }
}

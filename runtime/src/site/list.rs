//! Site-list input: one site per non-blank line.

use crate::error::ProbeError;
use std::path::Path;
use tracing::warn;

/// Sites selected from the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteList {
    /// Normalized URLs, in file order, at most the configured maximum.
    pub sites: Vec<String>,
    /// Non-blank entries found in the file.
    pub total: usize,
}

impl SiteList {
    /// Entries beyond the maximum that were dropped.
    pub fn dropped(&self) -> usize {
        self.total - self.sites.len()
    }

    pub fn truncated(&self) -> bool {
        self.dropped() > 0
    }
}

/// Read and normalize the site list at `path`, keeping the first `max`.
pub fn read_site_list(path: &Path, max: usize) -> Result<SiteList, ProbeError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ProbeError::SiteList {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_site_list(&raw, max))
}

/// Parse site-list text. Bare hostnames get `https://`.
pub fn parse_site_list(raw: &str, max: usize) -> SiteList {
    let entries: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(normalize_site)
        .collect();

    let total = entries.len();
    if total > max {
        warn!("site list has {total} entries, only the first {max} will be probed");
    }
    SiteList {
        sites: entries.into_iter().take(max).collect(),
        total,
    }
}

/// Prefix `https://` unless the entry already names a scheme.
pub fn normalize_site(entry: &str) -> String {
    if entry.starts_with("http") {
        entry.to_string()
    } else {
        format!("https://{entry}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Log sink shared with a scoped test subscriber.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_fifteen_lines_keep_ten() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..15 {
            writeln!(file, "site{i}.example").unwrap();
        }

        let logs = Captured::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();
        let list = tracing::subscriber::with_default(subscriber, || read_site_list(file.path(), 10)).unwrap();

        let output = logs.text();
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("15 entries, only the first 10"), "{output}");
        assert_eq!(list.sites.len(), 10);
        assert_eq!(list.total, 15);
        assert!(list.truncated());
        assert_eq!(list.dropped(), 5);
        assert_eq!(list.sites[0], "https://site0.example");
        assert_eq!(list.sites[9], "https://site9.example");
    }

    #[test]
    fn test_blank_lines_and_schemes() {
        let list = parse_site_list("\n  example.com  \n\nhttp://plain.example/\n\t\nhttps://secure.example\n", 10);
        assert_eq!(
            list.sites,
            vec!["https://example.com", "http://plain.example/", "https://secure.example"]
        );
        assert!(!list.truncated());
    }

    #[test]
    fn test_short_list_is_not_warned_about() {
        let logs = Captured::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();
        let list = tracing::subscriber::with_default(subscriber, || parse_site_list("a.example\nb.example\n", 10));

        assert_eq!(list.sites.len(), 2);
        assert!(logs.text().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = read_site_list(Path::new("/definitely/not/here.txt"), 10).unwrap_err();
        assert!(matches!(err, ProbeError::SiteList { .. }));
    }
}

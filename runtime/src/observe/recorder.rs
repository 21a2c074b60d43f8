//! JSONL network-activity recording for one page session.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One observed outgoing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEvent {
    pub timestamp: String,
    pub url: String,
    pub domain: String,
    pub third_party: bool,
    pub tracking: bool,
}

/// Append-only request log, flushed when the session ends.
pub struct NetworkRecorder {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl NetworkRecorder {
    /// Create (truncating) the log file.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("failed to open network log: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn log(&mut self, url: &str, domain: &str, third_party: bool, tracking: bool) -> Result<()> {
        let event = RequestEvent {
            timestamp: Utc::now().to_rfc3339(),
            url: url.to_string(),
            domain: domain.to_string(),
            third_party,
            tracking,
        };
        let json = serde_json::to_string(&event)?;
        writeln!(self.writer, "{json}")?;
        self.written += 1;
        Ok(())
    }

    /// Flush buffered events and return the log path.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer
            .flush()
            .with_context(|| format!("failed to flush network log: {}", self.path.display()))?;
        Ok(self.path)
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("site_home_network.jsonl");

        let mut recorder = NetworkRecorder::create(&path).unwrap();
        recorder
            .log("https://ad.doubleclick.net/x", "ad.doubleclick.net", true, true)
            .unwrap();
        recorder
            .log("https://example.com/app.js", "example.com", false, false)
            .unwrap();
        assert_eq!(recorder.written(), 2);
        let written_path = recorder.finish().unwrap();
        assert_eq!(written_path, path);

        let contents = std::fs::read_to_string(&path).unwrap();
        let events: Vec<RequestEvent> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert!(events[0].tracking && events[0].third_party);
        assert_eq!(events[1].domain, "example.com");
    }
}

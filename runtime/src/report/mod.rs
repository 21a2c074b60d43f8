//! Result persistence: `ranking.csv` and `results.json`.

pub mod dump;
pub mod ranking;

pub use dump::{RankedSite, RunReport};
pub use ranking::{write_ranking, RANKING_HEADER};

use crate::error::ProbeError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const RANKING_FILE: &str = "ranking.csv";
pub const RESULTS_FILE: &str = "results.json";

/// Files written for a run.
#[derive(Debug, Clone, Default)]
pub struct ReportPaths {
    /// Only written when the run was analyzed.
    pub ranking: Option<PathBuf>,
    pub results: PathBuf,
}

/// Write the JSON dump, and the ranking table when the run was analyzed.
pub fn write_all(dir: &Path, report: &RunReport) -> Result<ReportPaths, ProbeError> {
    std::fs::create_dir_all(dir).map_err(|e| ProbeError::Report {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let results = dir.join(RESULTS_FILE);
    let mut out = BufWriter::new(create(&results)?);
    serde_json::to_writer_pretty(&mut out, report)
        .map_err(std::io::Error::from)
        .and_then(|()| out.flush())
        .map_err(|e| ProbeError::Report {
            path: results.clone(),
            reason: e.to_string(),
        })?;
    info!("wrote {}", results.display());

    let ranking = if report.analyzed {
        let path = dir.join(RANKING_FILE);
        write_ranking(create(&path)?, report.records()).map_err(|e| ProbeError::Report {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        info!("wrote {}", path.display());
        Some(path)
    } else {
        None
    };

    Ok(ReportPaths { ranking, results })
}

fn create(path: &Path) -> Result<File, ProbeError> {
    File::create(path).map_err(|e| ProbeError::Report {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

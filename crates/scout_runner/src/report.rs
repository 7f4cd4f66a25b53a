//! Writing feature rows to disk.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use scout_core::analysis::MatchReport;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Name of the column holding the match label.
pub const LABEL_COLUMN: &str = "Replay";

/// Which files a batch writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum OutputFormat {
    /// `batch.json` only.
    Json,
    /// `features.csv` only.
    Csv,
    /// Both files.
    #[default]
    Both,
}

impl OutputFormat {
    /// Whether the JSON batch file is written.
    #[must_use]
    pub const fn writes_json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }

    /// Whether the CSV feature table is written.
    #[must_use]
    pub const fn writes_csv(self) -> bool {
        matches!(self, Self::Csv | Self::Both)
    }
}

/// Errors writing reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Filesystem failure.
    #[error("failed to write '{path}': {source}")]
    Io {
        /// File being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Union of the feature keys of all reports, sorted.
///
/// Matches differ in which keys they carry (a match without map analysis has
/// no `MapFeatures` keys), so the table uses every key seen.
#[must_use]
pub fn feature_columns(reports: &[MatchReport]) -> Vec<String> {
    let keys: BTreeSet<&str> = reports.iter().flat_map(|r| r.features.keys()).collect();
    keys.into_iter().map(str::to_string).collect()
}

/// Write one CSV row per report. Absent and missing values are empty cells.
pub fn write_features_csv(reports: &[MatchReport], path: &Path) -> Result<(), ReportError> {
    create_parent(path)?;
    let columns = feature_columns(reports);
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(std::iter::once(LABEL_COLUMN).chain(columns.iter().map(String::as_str)))?;
    for report in reports {
        let cells = columns.iter().map(|key| {
            report
                .features
                .get(key)
                .map(|value| value.to_cell())
                .unwrap_or_default()
        });
        writer.write_record(std::iter::once(report.label.clone()).chain(cells))?;
    }
    writer.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!(rows = reports.len(), columns = columns.len(), path = %path.display(), "Wrote feature table");
    Ok(())
}

/// Write a value as pretty JSON.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), ReportError> {
    create_parent(path)?;
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn create_parent(path: &Path) -> Result<(), ReportError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| ReportError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

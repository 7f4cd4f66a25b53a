//! Batch analysis of a directory of replays.
//!
//! Matches are analysed in parallel with rayon. Reference data and
//! configuration are shared read-only; every match gets its own working
//! tables, so one failing match never affects the others.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use scout_core::analysis::{MatchAnalyzer, MatchReport};
use scout_core::error::AnalysisError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::reference_loader::{load_config, load_reference, ReferenceLoadError};
use crate::report::{write_features_csv, write_json, OutputFormat, ReportError};
use crate::summary::BatchSummary;

/// File name of the JSON batch output.
pub const BATCH_FILE: &str = "batch.json";
/// File name of the CSV feature table.
pub const FEATURES_FILE: &str = "features.csv";

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory scanned for `*.json` replays
    pub input_dir: PathBuf,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Worker threads (0 = rayon default)
    pub parallel_matches: usize,
    /// Which output files to write
    pub format: OutputFormat,
    /// Reference data directory overriding the built-in tables
    pub reference_dir: Option<PathBuf>,
    /// Analysis configuration file
    pub config_path: Option<PathBuf>,
    /// Run the map feature engine
    pub include_map_analysis: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("replays"),
            output_dir: PathBuf::from("results"),
            parallel_matches: 0,
            format: OutputFormat::Both,
            reference_dir: None,
            config_path: None,
            include_map_analysis: true,
        }
    }
}

impl BatchConfig {
    /// Create config for an input directory
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            ..Default::default()
        }
    }

    /// Set output directory
    #[must_use]
    pub fn with_output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set worker thread count
    #[must_use]
    pub fn with_parallel(mut self, threads: usize) -> Self {
        self.parallel_matches = threads;
        self
    }

    /// Set output format
    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set reference data directory
    #[must_use]
    pub fn with_reference_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reference_dir = Some(dir.into());
        self
    }

    /// Set analysis configuration file
    #[must_use]
    pub fn with_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Skip map analysis
    #[must_use]
    pub fn without_map_analysis(mut self) -> Self {
        self.include_map_analysis = false;
        self
    }
}

/// A match that could not be analysed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Replay path
    pub path: String,
    /// Error message
    pub message: String,
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Successful matches, sorted by replay path
    pub reports: Vec<MatchReport>,
    /// Failed matches, sorted by replay path
    pub errors: Vec<BatchError>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        write_json(self, path)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }

    /// Write the files selected by the configured format into the output
    /// directory. Returns the paths written.
    pub fn write_outputs(&self) -> Result<Vec<PathBuf>, ReportError> {
        let mut written = Vec::new();
        if self.config.format.writes_json() {
            let path = self.config.output_dir.join(BATCH_FILE);
            self.save(&path)?;
            written.push(path);
        }
        if self.config.format.writes_csv() {
            let path = self.config.output_dir.join(FEATURES_FILE);
            write_features_csv(&self.reports, &path)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Errors that stop a whole batch.
#[derive(Debug, Error)]
pub enum BatchRunError {
    /// Reference data or configuration could not be loaded.
    #[error("{0}")]
    Load(#[from] ReferenceLoadError),

    /// The input directory could not be listed.
    #[error("cannot read input directory '{path}': {source}")]
    InputDir {
        /// Directory scanned.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The worker pool could not be created.
    #[error("cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// All `*.json` files directly inside `dir`, sorted.
pub fn discover_replays(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Build an analyzer from the batch's reference and configuration options.
pub fn build_analyzer(config: &BatchConfig) -> Result<MatchAnalyzer, ReferenceLoadError> {
    let reference = load_reference(config.reference_dir.as_deref())?;
    let analysis = load_config(config.config_path.as_deref())?;
    let analysis = if config.include_map_analysis {
        analysis
    } else {
        analysis.with_map_analysis(false)
    };
    Ok(MatchAnalyzer::new(Arc::new(reference), Arc::new(analysis)))
}

/// Run one match so that an error or a panic becomes a [`BatchError`] for
/// that match alone.
fn analyze_isolated(
    path: &Path,
    analyze: impl FnOnce() -> Result<MatchReport, AnalysisError>,
) -> Result<MatchReport, BatchError> {
    let message = match panic::catch_unwind(AssertUnwindSafe(analyze)) {
        Ok(Ok(report)) => return Ok(report),
        Ok(Err(e)) => e.to_string(),
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            format!("analysis panicked: {detail}")
        }
    };
    warn!(path = %path.display(), error = %message, "Match failed");
    Err(BatchError {
        path: path.display().to_string(),
        message,
    })
}

/// Analyse a list of replays with an existing analyzer.
///
/// Results come back sorted by path regardless of completion order.
pub fn analyze_paths(
    analyzer: &MatchAnalyzer,
    paths: &[PathBuf],
) -> (Vec<MatchReport>, Vec<BatchError>) {
    let completed = AtomicUsize::new(0);
    let total = paths.len();

    let mut outcomes: Vec<(&PathBuf, Result<MatchReport, BatchError>)> = paths
        .par_iter()
        .map(|path| {
            let outcome = analyze_isolated(path, || analyzer.analyze_file(path));
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 50 == 0 {
                debug!("Progress: {}/{}", done, total);
            }
            (path, outcome)
        })
        .collect();
    outcomes.sort_by(|a, b| a.0.cmp(b.0));

    let mut reports = Vec::new();
    let mut errors = Vec::new();
    for (_, outcome) in outcomes {
        match outcome {
            Ok(report) => reports.push(report),
            Err(error) => errors.push(error),
        }
    }
    (reports, errors)
}

/// Run a batch over every replay in the input directory.
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, BatchRunError> {
    let start = Instant::now();
    let analyzer = build_analyzer(&config)?;
    let paths = discover_replays(&config.input_dir).map_err(|source| BatchRunError::InputDir {
        path: config.input_dir.clone(),
        source,
    })?;

    info!(
        "Starting batch run: {} replays from {:?}",
        paths.len(),
        config.input_dir
    );

    let (reports, errors) = if config.parallel_matches > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_matches)
            .build()?
            .install(|| analyze_paths(&analyzer, &paths))
    } else {
        analyze_paths(&analyzer, &paths)
    };

    let summary = BatchSummary::from_reports(&reports, &errors);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} analysed, {} failed in {:.1}s",
        reports.len(),
        errors.len(),
        duration_seconds
    );

    Ok(BatchResults {
        config,
        reports,
        errors,
        summary,
        duration_seconds,
    })
}

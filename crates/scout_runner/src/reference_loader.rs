//! Reference data and configuration loading for the runner.
//!
//! Reference tables are compiled into `scout_core`; a directory on disk
//! overrides them file by file, so a balance patch only needs to ship the
//! tables it changes.

use std::path::{Path, PathBuf};

use scout_core::config::AnalysisConfig;
use scout_core::data::ReferenceData;
use scout_core::error::AnalysisError;
use tracing::{debug, info};

/// Environment variable naming a reference data directory.
pub const REFERENCE_DIR_ENV: &str = "SCOUT_REFERENCE_DIR";

/// Errors that can occur while loading reference data or configuration.
#[derive(Debug, Clone)]
pub enum ReferenceLoadError {
    /// Failed to read a file.
    IoError(String, String),
    /// A file was read but is not valid.
    ParseError(String, String),
    /// Directory not found.
    DirectoryNotFound(String),
}

impl std::fmt::Display for ReferenceLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(path, msg) => write!(f, "IO error reading '{}': {}", path, msg),
            Self::ParseError(path, msg) => write!(f, "Parse error in '{}': {}", path, msg),
            Self::DirectoryNotFound(path) => write!(f, "Directory not found: {}", path),
        }
    }
}

impl std::error::Error for ReferenceLoadError {}

impl From<AnalysisError> for ReferenceLoadError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Io { path, message } => Self::IoError(path, message),
            AnalysisError::InvalidReferenceData {
                source_name,
                message,
            }
            | AnalysisError::ConfigParse {
                source_name,
                message,
            } => Self::ParseError(source_name, message),
            other => Self::ParseError("reference data".to_string(), other.to_string()),
        }
    }
}

/// Resolve the default reference data directory.
///
/// Looks in order at:
/// 1. Environment variable `SCOUT_REFERENCE_DIR`
/// 2. `./crates/scout_core/data/` (repo root)
/// 3. `./data/` and `../scout_core/data/` (running from a crate)
pub fn default_reference_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(REFERENCE_DIR_ENV) {
        let path = PathBuf::from(dir);
        if path.is_dir() {
            return Some(path);
        }
    }

    let candidates = ["crates/scout_core/data", "data", "../scout_core/data"];
    candidates
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_dir())
}

/// Load reference data.
///
/// An explicit directory must exist. Without one the default directory is
/// used if found, else the built-in tables.
pub fn load_reference(dir: Option<&Path>) -> Result<ReferenceData, ReferenceLoadError> {
    let dir = match dir {
        Some(dir) if !dir.is_dir() => {
            return Err(ReferenceLoadError::DirectoryNotFound(
                dir.display().to_string(),
            ));
        }
        Some(dir) => Some(dir.to_path_buf()),
        None => default_reference_dir(),
    };

    let reference = match &dir {
        Some(dir) => {
            info!("Loading reference data from {:?}", dir);
            ReferenceData::load_from_dir(dir)?
        }
        None => {
            debug!("No reference directory found, using built-in tables");
            ReferenceData::builtin()?
        }
    };

    debug!(
        buildings = reference.buildings.len(),
        technologies = reference.technologies.len(),
        units = reference.units.len(),
        "Reference data ready"
    );
    Ok(reference)
}

/// Load the analysis configuration, or the defaults if no path is given.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, ReferenceLoadError> {
    match path {
        Some(path) => {
            info!("Loading analysis configuration from {:?}", path);
            Ok(AnalysisConfig::load(path)?)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

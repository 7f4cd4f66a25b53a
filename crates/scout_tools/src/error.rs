//! Error type for the tools.

use std::path::PathBuf;

use scout_core::error::AnalysisError;
use thiserror::Error;

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors reported by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Reference data failed to load or validate.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Filesystem failure.
    #[error("IO error on '{path}': {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// RON encoding failure.
    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    /// Directory not found.
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// Unknown table name on the command line.
    #[error("Unknown table '{0}' (expected buildings, technologies or units)")]
    UnknownTable(String),

    /// Unknown age name on the command line.
    #[error("Unknown age '{0}'")]
    UnknownAge(String),

    /// The entity is not in the table.
    #[error("'{entity}' is not in the {table} table")]
    UnknownEntity {
        /// Table consulted.
        table: String,
        /// Entity name.
        entity: String,
    },

    /// Validation found problems.
    #[error("{0} reference file(s) failed validation")]
    ValidationFailed(usize),
}

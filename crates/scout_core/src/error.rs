//! Error types for match analysis.

use thiserror::Error;

/// Result type alias using [`AnalysisError`].
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Top-level error type for everything that aborts the analysis of a match
/// or the loading of reference data.
///
/// Feature-level problems (an unknown technology, a milestone that was never
/// reached) are not errors; they are recorded in
/// [`Diagnostics`](crate::diagnostics::Diagnostics) and surface as missing
/// values in the feature row.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The replay document could not be parsed.
    #[error("Failed to parse replay '{source_name}': {message}")]
    ReplayParse {
        /// File name or other label for the replay.
        source_name: String,
        /// Error message.
        message: String,
    },

    /// Reading a file failed.
    #[error("IO error on '{path}': {message}")]
    Io {
        /// Path that could not be read or written.
        path: String,
        /// Error message.
        message: String,
    },

    /// No town centre could be reconstructed for a player, so no timeline
    /// can be anchored.
    #[error("No town centre found for player {player}; cannot anchor the timeline")]
    NoTownCentre {
        /// Player number.
        player: u32,
    },

    /// An event referenced an empty entity name, which means the upstream
    /// parser misread the record.
    #[error("Malformed {table} entity name in {context}")]
    MalformedEntity {
        /// Which reference table was consulted.
        table: String,
        /// Where the name came from (event type, timestamp).
        context: String,
    },

    /// The replay does not contain the two players needed for analysis.
    #[error("Expected at least 2 players, found {found}")]
    MissingPlayers {
        /// Number of players found.
        found: usize,
    },

    /// Reference tables failed validation.
    #[error("Invalid reference data in '{source_name}': {message}")]
    InvalidReferenceData {
        /// File or table name.
        source_name: String,
        /// What was wrong.
        message: String,
    },

    /// Analysis configuration failed to parse.
    #[error("Failed to parse analysis config '{source_name}': {message}")]
    ConfigParse {
        /// File name or other label for the configuration.
        source_name: String,
        /// Error message.
        message: String,
    },
}

impl AnalysisError {
    /// Whether this error is a match-level failure (as opposed to a problem
    /// with reference data or configuration shared by every match).
    #[must_use]
    pub const fn is_match_level(&self) -> bool {
        matches!(
            self,
            Self::ReplayParse { .. }
                | Self::NoTownCentre { .. }
                | Self::MalformedEntity { .. }
                | Self::MissingPlayers { .. }
        )
    }
}

//! # Scout Core
//!
//! Opening-strategy and map feature analysis for recorded matches.
//!
//! This crate is a pure library:
//! - No CLI
//! - No process-global state
//! - Files are read only through explicit loaders
//!
//! A parsed replay goes through one pass: per-player inputs are sliced out,
//! production buildings are reconstructed and their queues replayed into
//! completion times, the opening is classified, and the map's resources are
//! classified relative to both bases. The result is one flat feature row per
//! match.
//!
//! ## Crate Structure
//!
//! - [`data`] - Reference timing tables and production catalog
//! - [`replay`] - Raw replay document and cleaned-up events
//! - [`production`] - Serialized production queues
//! - [`factory`] - Recovering building instances from inputs
//! - [`strategy`] - Player timelines and opening classification
//! - [`map`] - Resource islands, corridor and placement
//! - [`analysis`] - The full pipeline

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod age;
pub mod analysis;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod factory;
pub mod features;
pub mod map;
pub mod parser;
pub mod production;
pub mod replay;
pub mod strategy;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::age::{Age, AgeTimes, Seconds};
    pub use crate::analysis::{MatchAnalyzer, MatchReport};
    pub use crate::config::AnalysisConfig;
    pub use crate::data::{EntryKind, ReferenceData, ReferenceTable, TableKind};
    pub use crate::diagnostics::{Diagnostics, Warning, WarningKind};
    pub use crate::error::{AnalysisError, Result};
    pub use crate::features::{FeatureRow, FeatureValue};
    pub use crate::parser::{JsonReplayParser, ReplayParser};
    pub use crate::production::{BuildingKind, CompletionRecord, ProductionBuilding};
    pub use crate::replay::{EventType, MatchEvent, Position, RawMatch};
    pub use crate::strategy::PlayerOpeningProfile;
}

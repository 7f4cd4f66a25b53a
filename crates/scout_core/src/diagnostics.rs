//! Per-match warning collection.
//!
//! A [`Diagnostics`] value is created for each match and passed by `&mut`
//! through the pipeline. Every warning is kept for the batch report and
//! mirrored to `tracing` so interactive runs still see it on stderr.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Category of a data-quality warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// An entity name is not modeled by the reference tables.
    UnknownEntity,
    /// A near-simultaneous duplicate input was dropped.
    DuplicateInput,
    /// More building identifiers were queued into than buildings were
    /// constructed.
    QueueOverflow,
    /// An unqueue input could not be matched to a queued item.
    UnqueueIgnored,
    /// A timestamp needed by a feature could not be resolved.
    MissingTimestamp,
    /// The opening-strategy table had no rule for the feature tuple.
    UnidentifiedStrategy,
    /// Map analysis was not run for this match.
    MapAnalysisSkipped,
    /// Map objects were out of bounds or duplicated.
    MapData,
}

/// A single warning raised while analysing a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Warning category.
    pub kind: WarningKind,
    /// Human-readable detail.
    pub message: String,
}

/// Collector for the warnings of one analysis pass.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    label: String,
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collector whose log lines carry a match label.
    #[must_use]
    pub fn for_match(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            warnings: Vec::new(),
        }
    }

    /// Record a warning.
    pub fn warn(&mut self, kind: WarningKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(replay = %self.label, kind = ?kind, "{message}");
        self.warnings.push(Warning { kind, message });
    }

    /// All warnings recorded so far, in order.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Number of warnings of one kind.
    #[must_use]
    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    /// Warning counts grouped by kind.
    #[must_use]
    pub fn counts_by_kind(&self) -> BTreeMap<WarningKind, usize> {
        let mut counts = BTreeMap::new();
        for warning in &self.warnings {
            *counts.entry(warning.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Consume the collector and return its warnings.
    #[must_use]
    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_in_order() {
        let mut diagnostics = Diagnostics::for_match("game_1");
        diagnostics.warn(WarningKind::UnknownEntity, "Unknown unit: Flaming Camel");
        diagnostics.warn(WarningKind::DuplicateInput, "Dropped Queue Villager");
        diagnostics.warn(WarningKind::UnknownEntity, "Unknown tech: Kamandaran");

        assert_eq!(diagnostics.warnings().len(), 3);
        assert_eq!(diagnostics.warnings()[1].kind, WarningKind::DuplicateInput);
        assert_eq!(diagnostics.count(WarningKind::UnknownEntity), 2);
        assert_eq!(diagnostics.counts_by_kind()[&WarningKind::DuplicateInput], 1);
    }

    #[test]
    fn test_empty_by_default() {
        let diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());
        assert!(diagnostics.into_warnings().is_empty());
    }
}

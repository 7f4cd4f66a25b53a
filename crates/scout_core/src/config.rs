//! Tunable thresholds of the analysis.
//!
//! Every value has a default matching the established balance of the game,
//! so an empty RON document `()` is a valid configuration.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::age::Seconds;
use crate::data::normalize_entity_name;
use crate::error::{AnalysisError, Result};

/// Top-level analysis configuration.
///
/// # Example RON
///
/// ```ron
/// (
///     include_map_analysis: true,
///     strategy: (late_feudal_threshold: 700.0),
///     map: (corridor_half_width: 30.0),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Run the map feature engine.
    #[serde(default = "default_true")]
    pub include_map_analysis: bool,

    /// Near-duplicate input removal.
    #[serde(default)]
    pub dedupe: DedupeConfig,

    /// Construction inputs at the same spot within this many seconds are one
    /// building.
    #[serde(default = "default_cluster_window")]
    pub building_cluster_window: Seconds,

    /// Opening classification thresholds.
    #[serde(default)]
    pub strategy: StrategyConfig,

    /// Dark-age villager estimate.
    #[serde(default)]
    pub villagers: VillagerConfig,

    /// Map feature engine thresholds.
    #[serde(default)]
    pub map: MapConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include_map_analysis: true,
            dedupe: DedupeConfig::default(),
            building_cluster_window: default_cluster_window(),
            strategy: StrategyConfig::default(),
            villagers: VillagerConfig::default(),
            map: MapConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ConfigParse`] if the text is not a valid
    /// configuration.
    pub fn from_ron_str(text: &str, source_name: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| AnalysisError::ConfigParse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Io`] if the file cannot be read, or
    /// [`AnalysisError::ConfigParse`] if it is not a valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_ron_str(&text, &path.display().to_string())
    }

    /// Disable or enable map analysis.
    #[must_use]
    pub fn with_map_analysis(mut self, enabled: bool) -> Self {
        self.include_map_analysis = enabled;
        self
    }
}

/// Rules for dropping repeated queue inputs the recorder sometimes emits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DedupeConfig {
    /// Inputs closer than this to the previous input are candidates.
    #[serde(default = "default_dedupe_gap")]
    pub max_gap: Seconds,
    /// Only inputs after this time are considered.
    #[serde(default = "default_dedupe_after")]
    pub after: Seconds,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            max_gap: default_dedupe_gap(),
            after: default_dedupe_after(),
        }
    }
}

/// Opening classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Feudal Age reached after this time counts as a late feudal.
    #[serde(default = "default_late_feudal")]
    pub late_feudal_threshold: Seconds,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            late_feudal_threshold: default_late_feudal(),
        }
    }
}

/// Dark-age villager estimate parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VillagerConfig {
    /// Seconds per villager.
    #[serde(default = "default_villager_cadence")]
    pub cadence: Seconds,
    /// Villagers at the start of the match.
    #[serde(default = "default_starting_villagers")]
    pub starting_villagers: u32,
    /// Per-civilization multiplier on the cadence.
    #[serde(default = "default_cadence_multipliers")]
    pub cadence_multipliers: BTreeMap<String, f64>,
    /// Per-civilization extra starting villagers.
    #[serde(default = "default_bonus_villagers")]
    pub bonus_villagers: BTreeMap<String, u32>,
}

impl Default for VillagerConfig {
    fn default() -> Self {
        Self {
            cadence: default_villager_cadence(),
            starting_villagers: default_starting_villagers(),
            cadence_multipliers: default_cadence_multipliers(),
            bonus_villagers: default_bonus_villagers(),
        }
    }
}

impl VillagerConfig {
    /// Villager cadence for a civilization.
    #[must_use]
    pub fn cadence_for(&self, civilization: &str) -> Seconds {
        let key = normalize_entity_name(civilization);
        let multiplier = self
            .cadence_multipliers
            .iter()
            .find(|(civ, _)| normalize_entity_name(civ) == key)
            .map_or(1.0, |(_, m)| *m);
        self.cadence * multiplier
    }

    /// Starting villagers for a civilization.
    #[must_use]
    pub fn starting_for(&self, civilization: &str) -> u32 {
        let key = normalize_entity_name(civilization);
        let bonus = self
            .bonus_villagers
            .iter()
            .find(|(civ, _)| normalize_entity_name(civ) == key)
            .map_or(0, |(_, b)| *b);
        self.starting_villagers + bonus
    }
}

/// Map feature engine thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Distance from the line between the bases to each corridor edge.
    #[serde(default = "default_corridor_half_width")]
    pub corridor_half_width: f64,
    /// Assignment cutoff as a fraction of the distance between the bases.
    #[serde(default = "default_cutoff_ratio")]
    pub assignment_cutoff_ratio: f64,
    /// Lower bound of the assignment cutoff in tiles.
    #[serde(default = "default_cutoff_floor")]
    pub assignment_cutoff_floor: f64,
    /// Fraction of forward tiles for a front woodline.
    #[serde(default = "default_front_ratio")]
    pub front_woodline_ratio: f64,
    /// Fraction of forward tiles for a side woodline.
    #[serde(default = "default_side_ratio")]
    pub side_woodline_ratio: f64,
    /// Smaller tree groups are stragglers, not woodlines.
    #[serde(default = "default_min_woodline")]
    pub min_woodline_tiles: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            corridor_half_width: default_corridor_half_width(),
            assignment_cutoff_ratio: default_cutoff_ratio(),
            assignment_cutoff_floor: default_cutoff_floor(),
            front_woodline_ratio: default_front_ratio(),
            side_woodline_ratio: default_side_ratio(),
            min_woodline_tiles: default_min_woodline(),
        }
    }
}

impl MapConfig {
    /// Distance beyond which a tile belongs to neither player.
    #[must_use]
    pub fn assignment_cutoff(&self, distance_between_players: f64) -> f64 {
        (self.assignment_cutoff_ratio * distance_between_players).max(self.assignment_cutoff_floor)
    }
}

const fn default_true() -> bool {
    true
}

const fn default_cluster_window() -> Seconds {
    0.25
}

const fn default_dedupe_gap() -> Seconds {
    0.25
}

const fn default_dedupe_after() -> Seconds {
    20.0
}

const fn default_late_feudal() -> Seconds {
    // 25 villagers plus loom.
    650.0
}

const fn default_villager_cadence() -> Seconds {
    25.0
}

const fn default_starting_villagers() -> u32 {
    3
}

fn default_cadence_multipliers() -> BTreeMap<String, f64> {
    BTreeMap::from([("Persians".to_string(), 0.95)])
}

fn default_bonus_villagers() -> BTreeMap<String, u32> {
    BTreeMap::from([("Mayans".to_string(), 1), ("Chinese".to_string(), 2)])
}

const fn default_corridor_half_width() -> f64 {
    25.0
}

const fn default_cutoff_ratio() -> f64 {
    0.4
}

const fn default_cutoff_floor() -> f64 {
    35.0
}

const fn default_front_ratio() -> f64 {
    0.6
}

const fn default_side_ratio() -> f64 {
    0.2
}

const fn default_min_woodline() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = AnalysisConfig::from_ron_str("()", "mem").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert!(config.include_map_analysis);
        assert_eq!(config.strategy.late_feudal_threshold, 650.0);
    }

    #[test]
    fn test_partial_override() {
        let config = AnalysisConfig::from_ron_str(
            "(include_map_analysis: false, map: (corridor_half_width: 30.0))",
            "mem",
        )
        .unwrap();
        assert!(!config.include_map_analysis);
        assert_eq!(config.map.corridor_half_width, 30.0);
        assert_eq!(config.map.assignment_cutoff_floor, 35.0);
    }

    #[test]
    fn test_villager_civ_adjustments() {
        let villagers = VillagerConfig::default();
        assert!((villagers.cadence_for("Persians") - 23.75).abs() < 1e-9);
        assert_eq!(villagers.cadence_for("Franks"), 25.0);
        assert_eq!(villagers.starting_for("Chinese"), 5);
        assert_eq!(villagers.starting_for("mayans"), 4);
    }

    #[test]
    fn test_assignment_cutoff_floor() {
        let map = MapConfig::default();
        assert_eq!(map.assignment_cutoff(50.0), 35.0);
        assert!((map.assignment_cutoff(150.0) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_bad_config_reports_source() {
        let err = AnalysisConfig::from_ron_str("(strategy: 5)", "analysis.ron").unwrap_err();
        assert!(err.to_string().contains("analysis.ron"));
    }
}

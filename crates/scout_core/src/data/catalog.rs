//! What each production building can make.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::production::BuildingKind;

/// Valid queue entries per production building kind, plus the unit groups
/// the opening classifier counts.
///
/// # Example RON
///
/// ```ron
/// (
///     producers: {
///         Barracks: ["Militia", "Man-at-Arms", "Spearman"],
///         TownCentre: ["Villager", "Loom", "Feudal Age"],
///     },
///     feudal_military_units: ["Scout Cavalry", "Skirmisher", "Archer", "Spearman"],
///     militia_units: ["Militia", "Man-at-Arms"],
///     military_buildings: ["Stable", "Archery Range", "Barracks"],
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionCatalog {
    /// Units and technologies queued at each building kind.
    pub producers: BTreeMap<BuildingKind, Vec<String>>,

    /// Units counted by the feudal opening classifier.
    #[serde(default)]
    pub feudal_military_units: Vec<String>,

    /// Dark-age infantry counted by the militia classifier.
    #[serde(default)]
    pub militia_units: Vec<String>,

    /// Buildings that produce military units.
    #[serde(default)]
    pub military_buildings: Vec<String>,
}

impl ProductionCatalog {
    /// Entities a building kind can queue. Empty for kinds not listed.
    #[must_use]
    pub fn valid_entities(&self, kind: BuildingKind) -> &[String] {
        self.producers.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Every entity named anywhere in the catalog, for cross-checking
    /// against the timing tables.
    pub fn all_entities(&self) -> impl Iterator<Item = &str> {
        self.producers
            .values()
            .flatten()
            .chain(&self.feudal_military_units)
            .chain(&self.militia_units)
            .map(String::as_str)
    }
}

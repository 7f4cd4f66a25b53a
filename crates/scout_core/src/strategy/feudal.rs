//! First feudal military building and feudal unit mix.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::age::Seconds;
use crate::data::ProductionCatalog;

use super::timeline::PlayerTimeline;

/// First military production building of the feudal age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpeningBuilding {
    /// Archery range.
    ArcheryRange,
    /// Stable.
    Stable,
    /// Neither was completed in the feudal window.
    TowersBarracksFc,
}

impl OpeningBuilding {
    /// Label used in feature rows.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ArcheryRange => "Archery Range",
            Self::Stable => "Stable",
            Self::TowersBarracksFc => "Towers/Barracks/FC",
        }
    }
}

impl std::fmt::Display for OpeningBuilding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Feudal military features of one player.
#[derive(Debug, Clone, PartialEq)]
pub struct FeudalStats {
    /// First archery range or stable.
    pub opening_building: OpeningBuilding,
    /// When it finished, or the feudal time for the fallback label.
    pub opening_time: Option<Seconds>,
    /// Units of each feudal type finished before Castle Age, keyed by unit
    /// name.
    pub unit_counts: BTreeMap<String, usize>,
}

impl FeudalStats {
    /// Number of units of a type finished before Castle Age.
    #[must_use]
    pub fn count(&self, unit: &str) -> usize {
        self.unit_counts.get(unit).copied().unwrap_or(0)
    }
}

/// Identify the feudal opening building and count feudal units.
#[must_use]
pub fn feudal_stats(
    timeline: &PlayerTimeline,
    catalog: &ProductionCatalog,
    castle_bound: Seconds,
) -> FeudalStats {
    let feudal = timeline.ages.feudal;

    let opening = feudal.and_then(|feudal| {
        [
            ("Archery Range", OpeningBuilding::ArcheryRange),
            ("Stable", OpeningBuilding::Stable),
        ]
        .into_iter()
        .flat_map(|(name, kind)| {
            timeline
                .buildings_named(name)
                .filter(move |b| b.completed_at > feudal && b.completed_at < castle_bound)
                .map(move |b| (kind, b.completed_at))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
    });

    let (opening_building, opening_time) = match opening {
        Some((kind, at)) => (kind, Some(at)),
        None => (OpeningBuilding::TowersBarracksFc, feudal),
    };

    let unit_counts = catalog
        .feudal_military_units
        .iter()
        .map(|unit| (unit.clone(), timeline.units_completed_before(unit, castle_bound)))
        .collect();

    FeudalStats {
        opening_building,
        opening_time,
        unit_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::age::{Age, AgeTimes};
    use crate::data::{EntryKind, ReferenceData};
    use crate::production::CompletionRecord;
    use crate::strategy::timeline::CompletedBuilding;

    fn building(name: &str, completed_at: Seconds) -> CompletedBuilding {
        CompletedBuilding {
            name: name.to_string(),
            clicked_at: completed_at - 30.0,
            completed_at,
            age: Age::Feudal,
            builders: 2,
        }
    }

    fn unit(name: &str, completed_at: Seconds) -> CompletionRecord {
        CompletionRecord {
            entity: name.to_string(),
            kind: EntryKind::Unit,
            requested_at: completed_at - 30.0,
            started_at: completed_at - 30.0,
            completed_at,
            instance_id: None,
        }
    }

    fn create_test_timeline(
        feudal: Option<Seconds>,
        buildings: Vec<CompletedBuilding>,
        units: Vec<CompletionRecord>,
    ) -> PlayerTimeline {
        PlayerTimeline {
            player: 2,
            civilization: "Mongols".to_string(),
            events: Vec::new(),
            technologies: BTreeMap::new(),
            ages: AgeTimes::new(feudal, Some(1400.0), None),
            buildings,
            town_centre_output: Vec::new(),
            military_output: units,
        }
    }

    #[test]
    fn test_first_of_range_and_stable() {
        let catalog = ReferenceData::builtin().unwrap().catalog;
        let timeline = create_test_timeline(
            Some(600.0),
            vec![building("Stable", 700.0), building("Archery Range", 650.0)],
            vec![unit("Archer", 700.0), unit("Archer", 730.0), unit("Scout Cavalry", 1500.0)],
        );
        let stats = feudal_stats(&timeline, &catalog, 1400.0);
        assert_eq!(stats.opening_building, OpeningBuilding::ArcheryRange);
        assert_eq!(stats.opening_time, Some(650.0));
        assert_eq!(stats.count("Archer"), 2);
        assert_eq!(stats.count("Scout Cavalry"), 0);
    }

    #[test]
    fn test_dark_age_range_does_not_count() {
        let catalog = ReferenceData::builtin().unwrap().catalog;
        let timeline = create_test_timeline(Some(600.0), vec![building("Archery Range", 580.0)], Vec::new());
        let stats = feudal_stats(&timeline, &catalog, 1400.0);
        assert_eq!(stats.opening_building, OpeningBuilding::TowersBarracksFc);
        assert_eq!(stats.opening_time, Some(600.0));
    }

    #[test]
    fn test_never_feudal() {
        let catalog = ReferenceData::builtin().unwrap().catalog;
        let timeline = create_test_timeline(None, vec![building("Stable", 700.0)], Vec::new());
        let stats = feudal_stats(&timeline, &catalog, 1400.0);
        assert_eq!(stats.opening_building, OpeningBuilding::TowersBarracksFc);
        assert_eq!(stats.opening_time, None);
        assert_eq!(stats.opening_building.to_string(), "Towers/Barracks/FC");
    }
}

//! Dark-age and early-feudal infantry pressure.

use serde::{Deserialize, Serialize};

use crate::age::Seconds;
use crate::data::ProductionCatalog;

use super::timeline::PlayerTimeline;

/// Infantry opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilitiaStrategy {
    /// Man-at-Arms upgrade researched.
    ManAtArms,
    /// Barracks before the mill with dark-age militia.
    PreMillDrush,
    /// Dark-age militia.
    Drush,
}

impl MilitiaStrategy {
    /// Label used in feature rows.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ManAtArms => "MAA",
            Self::PreMillDrush => "Pre-Mill Drush",
            Self::Drush => "Drush",
        }
    }
}

impl std::fmt::Display for MilitiaStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Infantry features of one player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MilitiaStats {
    /// First barracks placed before Castle Age finished building.
    pub first_barracks: Option<Seconds>,
    /// Identified infantry opening.
    pub strategy: Option<MilitiaStrategy>,
    /// Militia-line units finished in the dark age.
    pub dark_age_units: usize,
    /// Militia-line units finished before Castle Age.
    pub total_units: usize,
    /// Barracks finished before the first mill.
    pub pre_mill_barracks: bool,
}

/// Identify the infantry opening.
///
/// `castle_bound` is the Castle Age time, or the end of the match if the
/// player never got there.
#[must_use]
pub fn militia_stats(
    timeline: &PlayerTimeline,
    catalog: &ProductionCatalog,
    castle_bound: Seconds,
) -> MilitiaStats {
    let first_barracks = timeline
        .buildings_named("Barracks")
        .filter(|b| b.clicked_at < castle_bound)
        .map(|b| b.completed_at)
        .min_by(f64::total_cmp);
    let first_mill = timeline
        .buildings_named("Mill")
        .map(|b| b.completed_at)
        .min_by(f64::total_cmp);

    let pre_mill_barracks = match (first_barracks, first_mill) {
        (Some(barracks), Some(mill)) => barracks < mill,
        (Some(_), None) => true,
        (None, _) => false,
    };

    let dark_bound = timeline.ages.feudal.unwrap_or(castle_bound).min(castle_bound);
    let count_before = |bound: Seconds| -> usize {
        catalog
            .militia_units
            .iter()
            .map(|unit| timeline.units_completed_before(unit, bound))
            .sum()
    };
    let dark_age_units = count_before(dark_bound);
    let total_units = count_before(castle_bound);

    let man_at_arms = timeline.tech_time("Man-at-Arms").is_some();

    let strategy = if man_at_arms {
        Some(MilitiaStrategy::ManAtArms)
    } else if pre_mill_barracks && dark_age_units > 0 {
        Some(MilitiaStrategy::PreMillDrush)
    } else if dark_age_units > 0 || total_units > 0 {
        Some(MilitiaStrategy::Drush)
    } else {
        None
    };

    MilitiaStats {
        first_barracks,
        strategy,
        dark_age_units,
        total_units,
        pre_mill_barracks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::age::{Age, AgeTimes};
    use crate::data::{EntryKind, ReferenceData};
    use crate::production::CompletionRecord;
    use crate::strategy::timeline::CompletedBuilding;
    use std::collections::BTreeMap;

    fn building(name: &str, clicked_at: Seconds, completed_at: Seconds) -> CompletedBuilding {
        CompletedBuilding {
            name: name.to_string(),
            clicked_at,
            completed_at,
            age: Age::Dark,
            builders: 1,
        }
    }

    fn militia(completed_at: Seconds) -> CompletionRecord {
        CompletionRecord {
            entity: "Militia".to_string(),
            kind: EntryKind::Unit,
            requested_at: completed_at - 21.0,
            started_at: completed_at - 21.0,
            completed_at,
            instance_id: Some(1),
        }
    }

    fn create_test_timeline(
        buildings: Vec<CompletedBuilding>,
        units: Vec<CompletionRecord>,
        technologies: &[(&str, Seconds)],
    ) -> PlayerTimeline {
        PlayerTimeline {
            player: 1,
            civilization: "Franks".to_string(),
            events: Vec::new(),
            technologies: technologies
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
            ages: AgeTimes::new(Some(600.0), Some(1300.0), None),
            buildings,
            town_centre_output: Vec::new(),
            military_output: units,
        }
    }

    #[test]
    fn test_pre_mill_drush() {
        let catalog = ReferenceData::builtin().unwrap().catalog;
        let timeline = create_test_timeline(
            vec![building("Barracks", 200.0, 240.0), building("Mill", 300.0, 320.0)],
            vec![militia(300.0), militia(320.0), militia(340.0)],
            &[],
        );
        let stats = militia_stats(&timeline, &catalog, 1300.0);
        assert_eq!(stats.strategy, Some(MilitiaStrategy::PreMillDrush));
        assert_eq!(stats.dark_age_units, 3);
        assert!(stats.pre_mill_barracks);
        assert_eq!(stats.first_barracks, Some(240.0));
    }

    #[test]
    fn test_drush_after_mill() {
        let catalog = ReferenceData::builtin().unwrap().catalog;
        let timeline = create_test_timeline(
            vec![building("Mill", 150.0, 170.0), building("Barracks", 250.0, 290.0)],
            vec![militia(400.0)],
            &[],
        );
        let stats = militia_stats(&timeline, &catalog, 1300.0);
        assert_eq!(stats.strategy, Some(MilitiaStrategy::Drush));
        assert!(!stats.pre_mill_barracks);
    }

    #[test]
    fn test_man_at_arms_wins() {
        let catalog = ReferenceData::builtin().unwrap().catalog;
        let timeline = create_test_timeline(
            vec![building("Barracks", 500.0, 540.0)],
            vec![militia(700.0)],
            &[("man_at_arms", 680.0)],
        );
        let stats = militia_stats(&timeline, &catalog, 1300.0);
        assert_eq!(stats.strategy, Some(MilitiaStrategy::ManAtArms));
        assert_eq!(stats.dark_age_units, 0);
        assert_eq!(stats.total_units, 1);
    }

    #[test]
    fn test_man_at_arms_after_castle() {
        let catalog = ReferenceData::builtin().unwrap().catalog;
        let timeline = create_test_timeline(
            vec![building("Barracks", 1400.0, 1440.0)],
            Vec::new(),
            &[("man_at_arms", 1500.0)],
        );
        let stats = militia_stats(&timeline, &catalog, 1300.0);
        assert_eq!(stats.strategy, Some(MilitiaStrategy::ManAtArms));
        assert_eq!(stats.first_barracks, None);
    }

    #[test]
    fn test_no_infantry() {
        let catalog = ReferenceData::builtin().unwrap().catalog;
        let timeline = create_test_timeline(vec![building("Barracks", 500.0, 540.0)], Vec::new(), &[]);
        let stats = militia_stats(&timeline, &catalog, 1300.0);
        assert_eq!(stats.strategy, None);
        assert_eq!(MilitiaStrategy::PreMillDrush.to_string(), "Pre-Mill Drush");
    }
}

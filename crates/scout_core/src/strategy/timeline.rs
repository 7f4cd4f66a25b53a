//! Per-player reconstruction of when things actually happened.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::age::{Age, AgeTimes, Seconds};
use crate::config::{AnalysisConfig, DedupeConfig};
use crate::data::{normalize_entity_name, EntryKind, ReferenceData};
use crate::diagnostics::{Diagnostics, WarningKind};
use crate::error::{AnalysisError, Result};
use crate::factory::{build_production_buildings, starting_town_centre};
use crate::production::{BuildingKind, CompletionRecord};
use crate::replay::{EventType, MatchEvent, Position};

/// A building whose construction finished.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedBuilding {
    /// Building name as clicked.
    pub name: String,
    /// When the player placed it.
    pub clicked_at: Seconds,
    /// When construction finished.
    pub completed_at: Seconds,
    /// Age the player was in at completion.
    pub age: Age,
    /// Villagers sent to build it.
    pub builders: usize,
}

/// Who a timeline belongs to.
#[derive(Debug, Clone, Copy)]
pub struct PlayerInfo<'a> {
    /// Player number.
    pub number: u32,
    /// Civilization name.
    pub civilization: &'a str,
    /// Starting position, if the parser resolved it.
    pub start: Option<Position>,
}

/// Everything the strategy extractors need about one player.
#[derive(Debug, Clone)]
pub struct PlayerTimeline {
    /// Player number.
    pub player: u32,
    /// Civilization name.
    pub civilization: String,
    /// Inputs after de-duplication, in time order.
    pub events: Vec<MatchEvent>,
    /// Completion time per researched technology, keyed by normalized name.
    pub technologies: BTreeMap<String, Seconds>,
    /// Age-up completion times.
    pub ages: AgeTimes,
    /// Completed constructions, ordered by completion.
    pub buildings: Vec<CompletedBuilding>,
    /// Town centre output.
    pub town_centre_output: Vec<CompletionRecord>,
    /// Output of archery ranges, barracks, stables and siege workshops.
    pub military_output: Vec<CompletionRecord>,
}

impl PlayerTimeline {
    /// Reconstruct a player's timeline from their inputs.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::NoTownCentre`] if the player has neither a
    /// known starting position nor a constructed town centre.
    pub fn build(
        info: PlayerInfo<'_>,
        events: Vec<MatchEvent>,
        reference: &ReferenceData,
        config: &AnalysisConfig,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        let events = dedupe_inputs(events, &config.dedupe, diagnostics);
        let civ = info.civilization;
        let timings = reference.for_civilization(civ);

        let mut technologies = research_completions(&events, reference, civ, diagnostics);
        let ages = AgeTimes::new(
            technologies.get(&normalize_entity_name("Feudal Age")).copied(),
            technologies.get(&normalize_entity_name("Castle Age")).copied(),
            technologies.get(&normalize_entity_name("Imperial Age")).copied(),
        );

        let mut tc_events = Vec::with_capacity(events.len() + 1);
        if let Some(start) = info.start {
            let tc_time = reference
                .buildings
                .duration(BuildingKind::TownCentre.construction_name(), civ, Some(Age::Dark));
            if let Some(build_time) = tc_time {
                tc_events.push(starting_town_centre(info.number, start, build_time));
            }
        }
        tc_events.extend(events.iter().cloned());

        let town_centres = build_production_buildings(
            BuildingKind::TownCentre,
            reference.catalog.valid_entities(BuildingKind::TownCentre),
            &tc_events,
            config.building_cluster_window,
            diagnostics,
        );
        if town_centres.is_empty() {
            return Err(AnalysisError::NoTownCentre {
                player: info.number,
            });
        }

        let mut town_centre_output: Vec<CompletionRecord> = town_centres
            .iter()
            .flat_map(|tc| tc.produce(&timings, diagnostics))
            .collect();
        town_centre_output.sort_by(|a, b| a.completed_at.total_cmp(&b.completed_at));

        // The first town-centre completion of a technology replaces the
        // click-based estimate. Age-ups keep the click-based time.
        let age_ups: Vec<String> = Age::ALL
            .iter()
            .filter_map(Age::age_up_tech)
            .map(normalize_entity_name)
            .collect();
        let mut seen = HashSet::new();
        for record in town_centre_output
            .iter()
            .filter(|r| r.kind == EntryKind::Technology)
        {
            let key = normalize_entity_name(&record.entity);
            if age_ups.contains(&key) || !seen.insert(key.clone()) {
                continue;
            }
            technologies.insert(key, record.completed_at);
        }

        let mut military_output = Vec::new();
        for kind in BuildingKind::ALL.into_iter().filter(BuildingKind::is_military) {
            let buildings = build_production_buildings(
                kind,
                reference.catalog.valid_entities(kind),
                &events,
                config.building_cluster_window,
                diagnostics,
            );
            for building in &buildings {
                military_output.extend(building.produce(&timings, diagnostics));
            }
        }
        military_output.sort_by(|a, b| a.completed_at.total_cmp(&b.completed_at));

        let buildings = completed_buildings(&events, reference, civ, &ages, diagnostics)?;

        debug!(
            player = info.number,
            techs = technologies.len(),
            buildings = buildings.len(),
            units = military_output.len(),
            "Reconstructed player timeline"
        );

        Ok(Self {
            player: info.number,
            civilization: civ.to_string(),
            events,
            technologies,
            ages,
            buildings,
            town_centre_output,
            military_output,
        })
    }

    /// Completion time of a technology.
    #[must_use]
    pub fn tech_time(&self, name: &str) -> Option<Seconds> {
        self.technologies.get(&normalize_entity_name(name)).copied()
    }

    /// Completed buildings with the given name.
    pub fn buildings_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a CompletedBuilding> + 'a {
        let key = normalize_entity_name(name);
        self.buildings
            .iter()
            .filter(move |b| normalize_entity_name(&b.name) == key)
    }

    /// Military units with the given name completed strictly before `before`.
    #[must_use]
    pub fn units_completed_before(&self, name: &str, before: Seconds) -> usize {
        let key = normalize_entity_name(name);
        self.military_output
            .iter()
            .filter(|r| r.kind == EntryKind::Unit)
            .filter(|r| r.completed_at < before)
            .filter(|r| normalize_entity_name(&r.entity) == key)
            .count()
    }
}

/// Drop queue inputs that repeat the previous input within `max_gap`
/// seconds after the first `after` seconds of the match.
#[must_use]
pub fn dedupe_inputs(
    events: Vec<MatchEvent>,
    config: &DedupeConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<MatchEvent> {
    let mut kept = Vec::with_capacity(events.len());
    let mut previous: Option<MatchEvent> = None;

    for event in events {
        let duplicate = previous.as_ref().is_some_and(|prev| {
            event.event_type == EventType::Queue
                && event.timestamp > config.after
                && event.timestamp - prev.timestamp < config.max_gap
                && event.event_type == prev.event_type
                && event.param == prev.param
                && event.object_ids == prev.object_ids
        });
        if duplicate {
            diagnostics.warn(
                WarningKind::DuplicateInput,
                format!(
                    "dropped repeated {} '{}' at {:.2}s (player {})",
                    event.event_type, event.param, event.timestamp, event.player
                ),
            );
        } else {
            kept.push(event.clone());
        }
        previous = Some(event);
    }

    kept
}

/// Last click plus research duration for every researched technology.
fn research_completions(
    events: &[MatchEvent],
    reference: &ReferenceData,
    civilization: &str,
    diagnostics: &mut Diagnostics,
) -> BTreeMap<String, Seconds> {
    let mut last_click: BTreeMap<String, (&str, Seconds)> = BTreeMap::new();
    for event in events
        .iter()
        .filter(|e| e.event_type == EventType::Research && !e.param.trim().is_empty())
    {
        last_click.insert(
            normalize_entity_name(&event.param),
            (event.param.as_str(), event.timestamp),
        );
    }

    let mut completions = BTreeMap::new();
    for (key, (name, clicked_at)) in last_click {
        match reference.technologies.duration(name, civilization, None) {
            Some(duration) => {
                completions.insert(key, clicked_at + duration);
            }
            None => diagnostics.warn(
                WarningKind::UnknownEntity,
                format!("'{name}' is not in the {} table", reference.technologies.name()),
            ),
        }
    }
    completions
}

fn completed_buildings(
    events: &[MatchEvent],
    reference: &ReferenceData,
    civilization: &str,
    ages: &AgeTimes,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<CompletedBuilding>> {
    let mut buildings = Vec::new();
    for event in events
        .iter()
        .filter(|e| matches!(e.event_type, EventType::Build | EventType::Reseed))
    {
        let name = event.building_name();
        if name.trim().is_empty() {
            debug!(player = event.player, at = event.timestamp, "Construction input without a name");
            continue;
        }
        if !reference.buildings.exists(name, diagnostics)? {
            continue;
        }
        let age_at_click = ages.age_at(event.timestamp);
        let Some(build_time) = reference.buildings.duration(name, civilization, Some(age_at_click))
        else {
            continue;
        };

        let builders = event.object_ids.len().max(1);
        let completed_at = event.timestamp + 3.0 * build_time / (builders as f64 + 2.0);
        buildings.push(CompletedBuilding {
            name: name.to_string(),
            clicked_at: event.timestamp,
            completed_at,
            age: ages.age_at(completed_at),
            builders,
        });
    }
    buildings.sort_by(|a, b| a.completed_at.total_cmp(&b.completed_at));
    Ok(buildings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_reference() -> ReferenceData {
        ReferenceData::builtin().unwrap()
    }

    fn info(civilization: &str) -> PlayerInfo<'_> {
        PlayerInfo {
            number: 1,
            civilization,
            start: Some(Position::new(40.0, 40.0)),
        }
    }

    fn research(at: Seconds, tech: &str) -> MatchEvent {
        MatchEvent::new(at, EventType::Research, tech, 1).with_object_ids(&[100])
    }

    #[test]
    fn test_feudal_time_is_last_click_plus_duration() {
        let reference = create_test_reference();
        let events = vec![research(280.0, "Feudal Age"), research(300.0, "Feudal Age")];
        let mut diagnostics = Diagnostics::new();

        let timeline = PlayerTimeline::build(
            info("Franks"),
            events,
            &reference,
            &AnalysisConfig::default(),
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(timeline.ages.feudal, Some(430.0));
        assert_eq!(timeline.tech_time("Feudal Age"), Some(430.0));
    }

    #[test]
    fn test_no_start_and_no_town_centre_is_fatal() {
        let reference = create_test_reference();
        let mut diagnostics = Diagnostics::new();
        let player = PlayerInfo {
            number: 2,
            civilization: "Franks",
            start: None,
        };

        let err = PlayerTimeline::build(
            player,
            Vec::new(),
            &reference,
            &AnalysisConfig::default(),
            &mut diagnostics,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::NoTownCentre { player: 2 }));
    }

    #[test]
    fn test_town_centre_queue_overrides_loom() {
        let reference = create_test_reference();
        let events = vec![
            MatchEvent::new(0.0, EventType::Queue, "Villager", 1).with_object_ids(&[100]),
            research(10.0, "Loom"),
        ];
        let mut diagnostics = Diagnostics::new();

        let timeline = PlayerTimeline::build(
            info("Franks"),
            events,
            &reference,
            &AnalysisConfig::default(),
            &mut diagnostics,
        )
        .unwrap();
        // Loom waits for the villager: 25 + 25.
        assert_eq!(timeline.tech_time("Loom"), Some(50.0));
    }

    #[test]
    fn test_building_completion_uses_builders() {
        let reference = create_test_reference();
        let events = vec![MatchEvent::new(100.0, EventType::Build, "House", 1)
            .with_object_ids(&[1, 2, 3])
            .with_position(10.0, 10.0)];
        let mut diagnostics = Diagnostics::new();

        let timeline = PlayerTimeline::build(
            info("Franks"),
            events,
            &reference,
            &AnalysisConfig::default(),
            &mut diagnostics,
        )
        .unwrap();
        let house = &timeline.buildings[0];
        assert_eq!(house.builders, 3);
        assert!((house.completed_at - (100.0 + 3.0 * 25.0 / 5.0)).abs() < 1e-9);
        assert_eq!(house.age, Age::Dark);
    }

    #[test]
    fn test_dedupe_drops_repeated_queue() {
        let events = vec![
            MatchEvent::new(30.0, EventType::Queue, "Villager", 1).with_object_ids(&[5]),
            MatchEvent::new(30.1, EventType::Queue, "Villager", 1).with_object_ids(&[5]),
            MatchEvent::new(30.2, EventType::Queue, "Villager", 1).with_object_ids(&[6]),
            MatchEvent::new(5.0, EventType::Queue, "Villager", 1),
        ];
        let mut diagnostics = Diagnostics::new();

        let kept = dedupe_inputs(events, &DedupeConfig::default(), &mut diagnostics);
        assert_eq!(kept.len(), 3);
        assert_eq!(diagnostics.count(WarningKind::DuplicateInput), 1);
    }

    #[test]
    fn test_dedupe_ignores_early_game() {
        let events = vec![
            MatchEvent::new(1.0, EventType::Queue, "Villager", 1),
            MatchEvent::new(1.1, EventType::Queue, "Villager", 1),
        ];
        let mut diagnostics = Diagnostics::new();

        let kept = dedupe_inputs(events, &DedupeConfig::default(), &mut diagnostics);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_unknown_tech_warns() {
        let reference = create_test_reference();
        let events = vec![research(50.0, "Mystery Tech")];
        let mut diagnostics = Diagnostics::new();

        let timeline = PlayerTimeline::build(
            info("Franks"),
            events,
            &reference,
            &AnalysisConfig::default(),
            &mut diagnostics,
        )
        .unwrap();
        assert!(timeline.tech_time("Mystery Tech").is_none());
        assert_eq!(diagnostics.count(WarningKind::UnknownEntity), 1);
    }
}

//! Recover production building instances from a player's inputs.
//!
//! The input log never says "this unit was queued at building X" directly.
//! A queue input only lists the object ids of the building(s) it was issued
//! to, and a construction input carries no id at all. The game hands out
//! ids in creation order, so the distinct ids seen on queue inputs, sorted,
//! line up with the buildings in the order they were placed.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::age::Seconds;
use crate::data::{normalize_entity_name, EntryKind};
use crate::diagnostics::{Diagnostics, WarningKind};
use crate::production::{BuildingKind, ProductionBuilding, QueueEntry};
use crate::replay::{EventType, MatchEvent, Position};

const SAME_POSITION_EPSILON: f64 = 1e-6;

/// Most units one building can hold in its queue.
pub const MAX_QUEUE_PER_BUILDING: u32 = 15;

fn same_position(a: Option<Position>, b: Option<Position>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.distance(&b) < SAME_POSITION_EPSILON,
        (None, None) => true,
        _ => false,
    }
}

/// Synthetic construction input for the starting town centre, placed so that
/// it finishes exactly at the start of the match.
#[must_use]
pub fn starting_town_centre(player: u32, position: Position, build_time: Seconds) -> MatchEvent {
    MatchEvent::new(
        -build_time,
        EventType::Build,
        BuildingKind::TownCentre.construction_name(),
        player,
    )
    .with_position(position.x, position.y)
}

/// Build one [`ProductionBuilding`] per constructed building of `kind` and
/// distribute the matching queue and research inputs among them.
///
/// * Construction inputs at the same position within `cluster_window`
///   seconds are one building.
/// * Queue and research inputs whose `param` is in `valid_entities` are
///   assigned through their object ids. A click issued to several buildings
///   spreads its `amount` one unit at a time to the building with the
///   fewest entries so far (ties go to the lowest id).
/// * Inputs without object ids are spread the same way over every building.
/// * More distinct ids than buildings is reported as
///   [`WarningKind::QueueOverflow`]; the surplus ids are dropped.
/// * A click never queues more than [`MAX_QUEUE_PER_BUILDING`] units per
///   candidate building; larger amounts are clamped and reported as
///   [`WarningKind::QueueOverflow`].
/// * Unqueue inputs cannot be tied to a queued item and are reported as
///   [`WarningKind::UnqueueIgnored`].
///
/// A kind that was never built yields an empty list.
pub fn build_production_buildings(
    kind: BuildingKind,
    valid_entities: &[String],
    events: &[MatchEvent],
    cluster_window: Seconds,
    diagnostics: &mut Diagnostics,
) -> Vec<ProductionBuilding> {
    let mut buildings = cluster_constructions(kind, events, cluster_window);
    if buildings.is_empty() {
        return buildings;
    }

    let valid: HashSet<String> = valid_entities
        .iter()
        .map(|e| normalize_entity_name(e))
        .collect();
    let queued: Vec<&MatchEvent> = events
        .iter()
        .filter(|e| matches!(e.event_type, EventType::Queue | EventType::Research))
        .filter(|e| valid.contains(&normalize_entity_name(&e.param)))
        .collect();

    let unqueued = events
        .iter()
        .filter(|e| e.event_type == EventType::Unqueue)
        .filter(|e| valid.contains(&normalize_entity_name(&e.param)))
        .count();
    if unqueued > 0 {
        diagnostics.warn(
            WarningKind::UnqueueIgnored,
            format!("{unqueued} unqueue input(s) at {kind} cannot be matched and were ignored"),
        );
    }

    let distinct_ids: BTreeSet<u64> = queued
        .iter()
        .flat_map(|e| e.object_ids.iter().copied())
        .collect();
    if distinct_ids.len() > buildings.len() {
        diagnostics.warn(
            WarningKind::QueueOverflow,
            format!(
                "{} {kind} ids queued into but only {} constructed; extra ids dropped",
                distinct_ids.len(),
                buildings.len()
            ),
        );
    }

    let mut index_of: HashMap<u64, usize> = HashMap::new();
    for (index, id) in distinct_ids.into_iter().take(buildings.len()).enumerate() {
        buildings[index].instance_id = Some(id);
        index_of.insert(id, index);
    }

    let mut dropped = 0usize;
    for event in queued {
        let entry_kind = if event.event_type == EventType::Research {
            EntryKind::Technology
        } else {
            EntryKind::Unit
        };

        let candidates: Vec<usize> = if event.object_ids.is_empty() {
            (0..buildings.len()).collect()
        } else {
            let mut found: Vec<usize> = event
                .object_ids
                .iter()
                .filter_map(|id| index_of.get(id).copied())
                .collect();
            found.sort_unstable();
            found.dedup();
            found
        };
        if candidates.is_empty() {
            dropped += 1;
            continue;
        }

        let limit = MAX_QUEUE_PER_BUILDING.saturating_mul(candidates.len() as u32);
        let amount = if event.amount > limit {
            diagnostics.warn(
                WarningKind::QueueOverflow,
                format!(
                    "{} x {} at {:.2}s exceeds the {kind} queue; clamped to {limit}",
                    event.amount, event.param, event.timestamp
                ),
            );
            limit
        } else {
            event.amount
        };

        for _ in 0..amount {
            let Some(&target) = candidates
                .iter()
                .min_by_key(|&&i| (buildings[i].len(), i))
            else {
                break;
            };
            buildings[target].enqueue(QueueEntry::new(
                event.param.clone(),
                entry_kind,
                event.timestamp,
            ));
        }
    }

    if dropped > 0 {
        debug!(
            kind = %kind,
            dropped,
            "Queue inputs referenced only truncated building ids"
        );
    }

    buildings
}

fn cluster_constructions(
    kind: BuildingKind,
    events: &[MatchEvent],
    cluster_window: Seconds,
) -> Vec<ProductionBuilding> {
    let mut constructions: Vec<&MatchEvent> = events
        .iter()
        .filter(|e| e.event_type == EventType::Build)
        .filter(|e| BuildingKind::from_construction_name(e.building_name()) == Some(kind))
        .collect();
    constructions.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let mut buildings: Vec<ProductionBuilding> = Vec::new();
    for event in constructions {
        let duplicate = buildings.iter().any(|b| {
            same_position(b.position, event.position)
                && (event.timestamp - b.built_at).abs() <= cluster_window
        });
        if duplicate {
            continue;
        }
        let mut building = ProductionBuilding::new(kind, event.player, event.timestamp);
        building.position = event.position;
        buildings.push(building);
    }
    buildings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entities(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    fn build(at: Seconds, name: &str, x: f64, y: f64) -> MatchEvent {
        MatchEvent::new(at, EventType::Build, name, 1).with_position(x, y)
    }

    fn queue(at: Seconds, unit: &str, ids: &[u64]) -> MatchEvent {
        MatchEvent::new(at, EventType::Queue, unit, 1).with_object_ids(ids)
    }

    #[test]
    fn test_never_built_yields_nothing() {
        let events = vec![queue(100.0, "Archer", &[500])];
        let mut diagnostics = Diagnostics::new();
        let buildings = build_production_buildings(
            BuildingKind::ArcheryRange,
            &create_test_entities(&["Archer"]),
            &events,
            0.25,
            &mut diagnostics,
        );
        assert!(buildings.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_two_ranges_receive_their_own_units() {
        let events = vec![
            build(400.0, "Archery Range", 10.0, 10.0),
            build(405.0, "Archery Range", 30.0, 30.0),
            queue(460.0, "Archer", &[900]),
            queue(470.0, "Archer", &[950]),
            queue(480.0, "Archer", &[900]),
        ];
        let mut diagnostics = Diagnostics::new();
        let buildings = build_production_buildings(
            BuildingKind::ArcheryRange,
            &create_test_entities(&["Archer", "Skirmisher"]),
            &events,
            0.25,
            &mut diagnostics,
        );

        assert_eq!(buildings.len(), 2);
        assert_eq!(buildings[0].instance_id, Some(900));
        assert_eq!(buildings[0].len(), 2);
        assert_eq!(buildings[1].instance_id, Some(950));
        assert_eq!(buildings[1].len(), 1);
    }

    #[test]
    fn test_duplicate_construction_clustered() {
        let events = vec![
            build(400.0, "Barracks", 10.0, 10.0),
            build(400.1, "Barracks", 10.0, 10.0),
            build(400.2, "Barracks", 40.0, 10.0),
        ];
        let mut diagnostics = Diagnostics::new();
        let buildings = build_production_buildings(
            BuildingKind::Barracks,
            &create_test_entities(&["Militia"]),
            &events,
            0.25,
            &mut diagnostics,
        );
        assert_eq!(buildings.len(), 2);
    }

    #[test]
    fn test_multi_building_click_spreads_amount() {
        let events = vec![
            build(400.0, "Stable", 10.0, 10.0),
            build(401.0, "Stable", 20.0, 10.0),
            queue(500.0, "Scout Cavalry", &[700, 701]).with_amount(3),
        ];
        let mut diagnostics = Diagnostics::new();
        let buildings = build_production_buildings(
            BuildingKind::Stable,
            &create_test_entities(&["Scout Cavalry"]),
            &events,
            0.25,
            &mut diagnostics,
        );
        assert_eq!(buildings[0].len(), 2);
        assert_eq!(buildings[1].len(), 1);
    }

    #[test]
    fn test_overflow_truncates_with_warning() {
        let events = vec![
            build(400.0, "Barracks", 10.0, 10.0),
            queue(450.0, "Militia", &[300]),
            queue(460.0, "Militia", &[301]),
        ];
        let mut diagnostics = Diagnostics::new();
        let buildings = build_production_buildings(
            BuildingKind::Barracks,
            &create_test_entities(&["Militia"]),
            &events,
            0.25,
            &mut diagnostics,
        );
        assert_eq!(buildings.len(), 1);
        assert_eq!(buildings[0].len(), 1);
        assert_eq!(diagnostics.count(WarningKind::QueueOverflow), 1);
    }

    #[test]
    fn test_oversized_amount_is_clamped() {
        let events = vec![
            build(400.0, "Barracks", 10.0, 10.0),
            queue(450.0, "Militia", &[300]).with_amount(4_000_000_000),
        ];
        let mut diagnostics = Diagnostics::new();
        let buildings = build_production_buildings(
            BuildingKind::Barracks,
            &create_test_entities(&["Militia"]),
            &events,
            0.25,
            &mut diagnostics,
        );
        assert_eq!(buildings[0].len(), MAX_QUEUE_PER_BUILDING as usize);
        assert_eq!(diagnostics.count(WarningKind::QueueOverflow), 1);
    }

    #[test]
    fn test_research_becomes_technology_entry() {
        let events = vec![
            build(300.0, "Barracks", 10.0, 10.0),
            MatchEvent::new(700.0, EventType::Research, "Man-at-Arms", 1).with_object_ids(&[42]),
        ];
        let mut diagnostics = Diagnostics::new();
        let buildings = build_production_buildings(
            BuildingKind::Barracks,
            &create_test_entities(&["Militia", "Man-at-Arms"]),
            &events,
            0.25,
            &mut diagnostics,
        );
        assert_eq!(buildings[0].queue[0].kind, EntryKind::Technology);
    }

    #[test]
    fn test_unqueue_reported() {
        let events = vec![
            build(300.0, "Barracks", 10.0, 10.0),
            MatchEvent::new(320.0, EventType::Unqueue, "Militia", 1),
        ];
        let mut diagnostics = Diagnostics::new();
        build_production_buildings(
            BuildingKind::Barracks,
            &create_test_entities(&["Militia"]),
            &events,
            0.25,
            &mut diagnostics,
        );
        assert_eq!(diagnostics.count(WarningKind::UnqueueIgnored), 1);
    }

    #[test]
    fn test_starting_town_centre_is_virtual_build() {
        let tc = starting_town_centre(2, Position::new(50.0, 60.0), 150.0);
        let events = vec![tc, queue(0.0, "Villager", &[10]), queue(1.0, "Villager", &[10])];
        let mut diagnostics = Diagnostics::new();
        let buildings = build_production_buildings(
            BuildingKind::TownCentre,
            &create_test_entities(&["Villager", "Loom"]),
            &events,
            0.25,
            &mut diagnostics,
        );
        assert_eq!(buildings.len(), 1);
        assert_eq!(buildings[0].built_at, -150.0);
        assert_eq!(buildings[0].len(), 2);
    }
}

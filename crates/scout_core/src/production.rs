//! Production buildings and their serialized queues.
//!
//! A building makes one item at a time. Replaying its queue turns player
//! clicks (when something was *requested*) into completion times (when it
//! actually *appeared*): each item starts at the later of its request and
//! the previous completion.

use serde::{Deserialize, Serialize};

use crate::age::Seconds;
use crate::data::{normalize_entity_name, DurationLookup, EntryKind};
use crate::diagnostics::{Diagnostics, WarningKind};
use crate::replay::Position;

/// Kind of production building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Trains ranged infantry.
    ArcheryRange,
    /// Trains infantry.
    Barracks,
    /// Trains cavalry.
    Stable,
    /// Builds siege weapons.
    SiegeWorkshop,
    /// Trains villagers and researches economy and age-up technologies.
    TownCentre,
}

impl BuildingKind {
    /// All production building kinds.
    pub const ALL: [Self; 5] = [
        Self::ArcheryRange,
        Self::Barracks,
        Self::Stable,
        Self::SiegeWorkshop,
        Self::TownCentre,
    ];

    /// Name used by construction inputs and the buildings table.
    #[must_use]
    pub const fn construction_name(&self) -> &'static str {
        match self {
            Self::ArcheryRange => "Archery Range",
            Self::Barracks => "Barracks",
            Self::Stable => "Stable",
            Self::SiegeWorkshop => "Siege Workshop",
            Self::TownCentre => "Town Center",
        }
    }

    /// Parse a construction name. Accepts both spellings of the town centre.
    #[must_use]
    pub fn from_construction_name(name: &str) -> Option<Self> {
        match normalize_entity_name(name).as_str() {
            "archery_range" => Some(Self::ArcheryRange),
            "barracks" => Some(Self::Barracks),
            "stable" => Some(Self::Stable),
            "siege_workshop" => Some(Self::SiegeWorkshop),
            "town_center" | "town_centre" => Some(Self::TownCentre),
            _ => None,
        }
    }

    /// Kinds that produce military units.
    #[must_use]
    pub const fn is_military(&self) -> bool {
        !matches!(self, Self::TownCentre)
    }
}

impl std::fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.construction_name())
    }
}

/// One requested unit or research.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Entity requested.
    pub entity: String,
    /// Unit or technology.
    pub kind: EntryKind,
    /// When the player clicked.
    pub requested_at: Seconds,
}

impl QueueEntry {
    /// Create a queue entry.
    #[must_use]
    pub fn new(entity: impl Into<String>, kind: EntryKind, requested_at: Seconds) -> Self {
        Self {
            entity: entity.into(),
            kind,
            requested_at,
        }
    }
}

/// A finished item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Entity produced.
    pub entity: String,
    /// Unit or technology.
    pub kind: EntryKind,
    /// When the player clicked.
    pub requested_at: Seconds,
    /// When the building started on it.
    pub started_at: Seconds,
    /// When it appeared.
    pub completed_at: Seconds,
    /// Building instance that produced it.
    pub instance_id: Option<u64>,
}

/// One physical production building and everything queued at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionBuilding {
    /// Building kind.
    pub kind: BuildingKind,
    /// Object id recovered from the queue inputs; `None` if nothing was ever
    /// queued here.
    pub instance_id: Option<u64>,
    /// Where it was placed.
    pub position: Option<Position>,
    /// Owning player.
    pub player: u32,
    /// When construction was ordered. Negative for the starting town centre.
    pub built_at: Seconds,
    /// Requests in the order they were made.
    pub queue: Vec<QueueEntry>,
}

impl ProductionBuilding {
    /// Create a building with an empty queue.
    #[must_use]
    pub const fn new(kind: BuildingKind, player: u32, built_at: Seconds) -> Self {
        Self {
            kind,
            instance_id: None,
            position: None,
            player,
            built_at,
            queue: Vec::new(),
        }
    }

    /// Set the placement position.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the recovered instance id.
    #[must_use]
    pub fn with_instance_id(mut self, id: u64) -> Self {
        self.instance_id = Some(id);
        self
    }

    /// Append a request.
    pub fn enqueue(&mut self, entry: QueueEntry) {
        self.queue.push(entry);
    }

    /// Number of requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing was queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Replay the queue one item at a time.
    ///
    /// Requests are processed in `requested_at` order. An entity the lookup
    /// cannot time is skipped with an [`WarningKind::UnknownEntity`] warning
    /// and does not delay the items after it.
    pub fn produce(
        &self,
        lookup: &impl DurationLookup,
        diagnostics: &mut Diagnostics,
    ) -> Vec<CompletionRecord> {
        let mut ordered: Vec<&QueueEntry> = self.queue.iter().collect();
        ordered.sort_by(|a, b| a.requested_at.total_cmp(&b.requested_at));

        let mut records = Vec::with_capacity(ordered.len());
        let mut previous: Option<Seconds> = None;

        for entry in ordered {
            let Some(duration) = lookup.duration(&entry.entity, entry.kind) else {
                diagnostics.warn(
                    WarningKind::UnknownEntity,
                    format!(
                        "no production time for '{}' at {} (player {}), skipped",
                        entry.entity, self.kind, self.player
                    ),
                );
                continue;
            };

            let started_at = previous.map_or(entry.requested_at, |p| p.max(entry.requested_at));
            let completed_at = started_at + duration;
            previous = Some(completed_at);

            records.push(CompletionRecord {
                entity: entry.entity.clone(),
                kind: entry.kind,
                requested_at: entry.requested_at,
                started_at,
                completed_at,
                instance_id: self.instance_id,
            });
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixed_lookup(seconds: Seconds) -> impl DurationLookup {
        move |_: &str, _: EntryKind| Some(seconds)
    }

    fn create_test_building(requests: &[(&str, Seconds)]) -> ProductionBuilding {
        let mut building = ProductionBuilding::new(BuildingKind::TownCentre, 1, -150.0);
        for (entity, at) in requests {
            building.enqueue(QueueEntry::new(*entity, EntryKind::Unit, *at));
        }
        building
    }

    #[test]
    fn test_single_item_completes_after_duration() {
        let building = create_test_building(&[("Villager", 0.0)]);
        let mut diagnostics = Diagnostics::new();

        let records = building.produce(&fixed_lookup(25.0), &mut diagnostics);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].completed_at, 25.0);
        assert_eq!(records[0].started_at, 0.0);
    }

    #[test]
    fn test_second_item_waits_for_first() {
        let building = create_test_building(&[("Villager", 0.0), ("Villager", 10.0)]);
        let mut diagnostics = Diagnostics::new();

        let records = building.produce(&fixed_lookup(25.0), &mut diagnostics);
        assert_eq!(records[0].completed_at, 25.0);
        assert_eq!(records[1].started_at, 25.0);
        assert_eq!(records[1].completed_at, 50.0);
    }

    #[test]
    fn test_idle_building_starts_immediately() {
        let building = create_test_building(&[("Villager", 0.0), ("Villager", 100.0)]);
        let mut diagnostics = Diagnostics::new();

        let records = building.produce(&fixed_lookup(25.0), &mut diagnostics);
        assert_eq!(records[1].started_at, 100.0);
        assert_eq!(records[1].completed_at, 125.0);
    }

    #[test]
    fn test_unknown_entity_skipped_without_delay() {
        let building = create_test_building(&[
            ("Villager", 0.0),
            ("Mystery", 1.0),
            ("Villager", 2.0),
        ]);
        let lookup = |entity: &str, _: EntryKind| (entity == "Villager").then_some(25.0);
        let mut diagnostics = Diagnostics::new();

        let records = building.produce(&lookup, &mut diagnostics);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].completed_at, 50.0);
        assert_eq!(diagnostics.count(WarningKind::UnknownEntity), 1);
    }

    #[test]
    fn test_entry_kind_reaches_lookup() {
        let mut building = ProductionBuilding::new(BuildingKind::Barracks, 1, 100.0);
        building.enqueue(QueueEntry::new("Man-at-Arms", EntryKind::Technology, 400.0));
        let lookup = |_: &str, kind: EntryKind| match kind {
            EntryKind::Unit => Some(21.0),
            EntryKind::Technology => Some(40.0),
        };
        let mut diagnostics = Diagnostics::new();

        let records = building.produce(&lookup, &mut diagnostics);
        assert_eq!(records[0].completed_at, 440.0);
    }

    #[test]
    fn test_empty_queue_produces_nothing() {
        let building = ProductionBuilding::new(BuildingKind::Stable, 2, 500.0);
        let mut diagnostics = Diagnostics::new();
        assert!(building.produce(&fixed_lookup(30.0), &mut diagnostics).is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_construction_names() {
        assert_eq!(BuildingKind::TownCentre.construction_name(), "Town Center");
        assert_eq!(BuildingKind::ArcheryRange.to_string(), "Archery Range");
        assert!(!BuildingKind::TownCentre.is_military());
        assert_eq!(
            BuildingKind::from_construction_name("Town Centre"),
            Some(BuildingKind::TownCentre)
        );
        assert_eq!(BuildingKind::from_construction_name("House"), None);
    }

    proptest! {
        #[test]
        fn prop_completions_non_decreasing(
            requests in prop::collection::vec(0.0f64..2000.0, 0..40),
            duration in 1.0f64..120.0,
        ) {
            let mut building = ProductionBuilding::new(BuildingKind::Barracks, 1, 0.0);
            for at in &requests {
                building.enqueue(QueueEntry::new("Militia", EntryKind::Unit, *at));
            }
            let mut diagnostics = Diagnostics::new();
            let records = building.produce(&fixed_lookup(duration), &mut diagnostics);

            prop_assert_eq!(records.len(), requests.len());
            for pair in records.windows(2) {
                prop_assert!(pair[0].completed_at <= pair[1].completed_at);
            }
            for record in &records {
                prop_assert!(record.completed_at >= record.requested_at + duration - 1e-9);
                if record.started_at > record.requested_at {
                    prop_assert!(record.completed_at >= record.requested_at + duration);
                }
            }
        }
    }
}

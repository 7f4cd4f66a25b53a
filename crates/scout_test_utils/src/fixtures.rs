//! Replay fixtures.
//!
//! [`ReplayBuilder`] assembles a [`RawMatch`] the way the external parser
//! would emit it, so tests can drive the whole pipeline from JSON.

use scout_core::replay::{
    EventType, PlayerSlot, RawEvent, RawGaiaObject, RawMatch, RawPayload, RawPlayer, RawPosition,
    RawTile,
};

/// Create a raw input record.
#[must_use]
pub fn input(timestamp: f64, player: u32, event_type: EventType, param: &str) -> RawEvent {
    RawEvent {
        timestamp: Some(timestamp),
        event_type,
        param: Some(param.to_string()),
        player: Some(player),
        position: None,
        payload: RawPayload::default(),
    }
}

/// Queue `unit` at the building with id `building_id`.
#[must_use]
pub fn queue(timestamp: f64, player: u32, unit: &str, building_id: u64) -> RawEvent {
    let mut event = input(timestamp, player, EventType::Queue, unit);
    event.payload.object_ids = Some(vec![building_id]);
    event
}

/// Research `tech` at the building with id `building_id`.
#[must_use]
pub fn research(timestamp: f64, player: u32, tech: &str, building_id: u64) -> RawEvent {
    let mut event = input(timestamp, player, EventType::Research, tech);
    event.payload.object_ids = Some(vec![building_id]);
    event
}

/// Place `building` at `(x, y)` with `villagers` builders.
#[must_use]
pub fn build(timestamp: f64, player: u32, building: &str, x: f64, y: f64, villagers: usize) -> RawEvent {
    let mut event = input(timestamp, player, EventType::Build, building);
    event.position = Some(RawPosition::at(x, y));
    event.payload.building = Some(building.to_string());
    event.payload.object_ids = Some((1..=villagers as u64).map(|id| 10_000 + id).collect());
    event
}

/// Place a palisade segment from `from` to `to`.
#[must_use]
pub fn palisade(timestamp: f64, player: u32, from: (f64, f64), to: (f64, f64)) -> RawEvent {
    let mut event = input(timestamp, player, EventType::Wall, "");
    event.position = Some(RawPosition::at(from.0, from.1));
    event.payload.building = Some("Palisade Wall".to_string());
    event.payload.x_end = Some(to.0);
    event.payload.y_end = Some(to.1);
    event
}

/// Create a player entry.
#[must_use]
pub fn player(number: u32, civilization: &str, x: f64, y: f64) -> RawPlayer {
    RawPlayer {
        number,
        name: format!("Player {number}"),
        civilization: civilization.to_string(),
        position: RawPosition::at(x, y),
        winner: None,
        rate_snapshot: None,
    }
}

/// Create a gaia object.
#[must_use]
pub fn gaia(name: &str, x: f64, y: f64) -> RawGaiaObject {
    RawGaiaObject {
        instance_id: None,
        name: name.to_string(),
        position: RawPosition::at(x, y),
    }
}

/// Builder for a replay document.
#[derive(Debug, Clone, Default)]
pub struct ReplayBuilder {
    raw: RawMatch,
}

impl ReplayBuilder {
    /// Empty replay with a flat map of the given size.
    #[must_use]
    pub fn new(dimension: u32) -> Self {
        let mut raw = RawMatch::default();
        raw.map.dimension = dimension;
        raw.map.name = Some("Arabia".to_string());
        raw.rated = Some(true);
        raw.speed = Some("Normal".to_string());
        raw.dataset = Some("Definitive Edition".to_string());
        raw.starting_age = Some("Dark Age".to_string());
        Self { raw }
    }

    /// Add a player.
    #[must_use]
    pub fn with_player(mut self, player: RawPlayer) -> Self {
        self.raw.players.push(PlayerSlot::Player(player));
        self
    }

    /// Add a non-player entry such as the parser emits for empty slots.
    #[must_use]
    pub fn with_placeholder(mut self) -> Self {
        self.raw.players.push(PlayerSlot::Other(serde_json::Value::Null));
        self
    }

    /// Add inputs.
    #[must_use]
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = RawEvent>) -> Self {
        self.raw.inputs.extend(inputs);
        self
    }

    /// Add gaia objects.
    #[must_use]
    pub fn with_gaia(mut self, objects: impl IntoIterator<Item = RawGaiaObject>) -> Self {
        self.raw.gaia.extend(objects);
        self
    }

    /// Fill the terrain with tiles whose elevation is given by `height`.
    #[must_use]
    pub fn with_terrain(mut self, height: impl Fn(u32, u32) -> f64) -> Self {
        let dimension = self.raw.map.dimension;
        self.raw.map.tiles = (0..dimension)
            .flat_map(|x| (0..dimension).map(move |y| (x, y)))
            .map(|(x, y)| RawTile {
                position: RawPosition::at(f64::from(x), f64::from(y)),
                elevation: height(x, y),
                terrain: None,
            })
            .collect();
        self
    }

    /// Set the match length.
    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.raw.duration = Some(seconds);
        self
    }

    /// Finish as a parsed document.
    #[must_use]
    pub fn build(self) -> RawMatch {
        self.raw
    }

    /// Finish as the JSON text the parser would produce.
    ///
    /// # Panics
    ///
    /// Panics if the document cannot be serialized, which would be a bug in
    /// the replay types.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.raw).expect("replay document serializes")
    }
}

/// A two-player Franks mirror on a 120-tile map with the bases on the
/// horizontal midline.
#[must_use]
pub fn standard_match() -> ReplayBuilder {
    ReplayBuilder::new(120)
        .with_player(player(1, "Franks", 20.0, 60.0))
        .with_player(player(2, "Franks", 100.0, 60.0))
        .with_terrain(|_, _| 1.0)
        .with_duration(1800.0)
}

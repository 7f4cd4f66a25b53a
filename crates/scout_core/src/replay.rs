//! Parsed replay document and the per-player event records derived from it.
//!
//! The `Raw*` types mirror the JSON produced by the external replay parser
//! and are deliberately permissive: most fields are optional because the
//! parser leaves them out when it cannot resolve them. [`MatchEvent`] is the
//! cleaned-up record the rest of the pipeline consumes.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::age::Seconds;
use crate::diagnostics::{Diagnostics, WarningKind};

/// A map position in tile units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A position as the parser emits it; either coordinate may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    /// X coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Y coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl RawPosition {
    /// Position with both coordinates set.
    #[must_use]
    pub const fn at(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }

    /// The position, if both coordinates are known.
    #[must_use]
    pub fn resolve(&self) -> Option<Position> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(Position::new(x, y)),
            _ => None,
        }
    }
}

impl From<Position> for RawPosition {
    fn from(p: Position) -> Self {
        Self::at(p.x, p.y)
    }
}

/// Parse a `H:MM:SS[.ffffff]` (or `MM:SS`) duration string into seconds.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<Seconds> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<f64>().ok()?, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
        [m, s] => (0.0, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
        [s] => (0.0, 0.0, s.parse::<f64>().ok()?),
        _ => return None,
    };
    let total = hours * 3600.0 + minutes * 60.0 + seconds;
    total.is_finite().then_some(total)
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<Seconds>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stamp {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Stamp>::deserialize(deserializer)? {
        Some(Stamp::Number(n)) if n.is_finite() => Some(n),
        Some(Stamp::Text(text)) => parse_timestamp(&text),
        _ => None,
    })
}

/// Type of a player input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    /// Train a unit.
    Queue,
    /// Cancel a queued unit.
    Unqueue,
    /// Start a research.
    Research,
    /// Place a building.
    Build,
    /// Reseed a farm.
    Reseed,
    /// Place a wall segment.
    Wall,
    /// Any other input type; ignored by the analysis.
    Other(String),
}

impl EventType {
    /// Name as it appears in the replay document.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queue => "Queue",
            Self::Unqueue => "Unqueue",
            Self::Research => "Research",
            Self::Build => "Build",
            Self::Reseed => "Reseed",
            Self::Wall => "Wall",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Queue" => Self::Queue,
            "Unqueue" => Self::Unqueue,
            "Research" => Self::Research,
            "Build" => Self::Build,
            "Reseed" => Self::Reseed,
            "Wall" => Self::Wall,
            _ => Self::Other(name),
        }
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific fields of an input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPayload {
    /// Units or buildings the input was issued to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_ids: Option<Vec<u64>>,
    /// Building name for Build, Reseed and Wall inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    /// Wall segment end X.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_end: Option<f64>,
    /// Wall segment end Y.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_end: Option<f64>,
    /// Units requested by one queue click.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
}

/// One record of the `inputs` or `actions` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Time since match start.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: Option<Seconds>,
    /// Input type.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Entity acted upon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    /// Issuing player.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<u32>,
    /// Target position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<RawPosition>,
    /// Type-specific fields.
    #[serde(default)]
    pub payload: RawPayload,
}

/// A player entry of the `players` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPlayer {
    /// Player number (1-based).
    pub number: u32,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Civilization name.
    #[serde(default)]
    pub civilization: String,
    /// Starting position; may be empty.
    #[serde(default)]
    pub position: RawPosition,
    /// Whether the player won.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<bool>,
    /// Rating at the time of the match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_snapshot: Option<f64>,
}

/// Entry of the `players` list. Team games can carry non-object entries,
/// which are kept as [`PlayerSlot::Other`] and ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerSlot {
    /// A real player.
    Player(RawPlayer),
    /// Anything else.
    Other(serde_json::Value),
}

/// One map cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTile {
    /// Cell position.
    #[serde(default)]
    pub position: RawPosition,
    /// Height level.
    #[serde(default)]
    pub elevation: f64,
    /// Terrain id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terrain: Option<u32>,
}

/// Map metadata and terrain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMap {
    /// Side length in tiles.
    #[serde(default)]
    pub dimension: u32,
    /// Map name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Every cell with its elevation.
    #[serde(default)]
    pub tiles: Vec<RawTile>,
}

/// A neutral map object (tree, mine, animal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGaiaObject {
    /// Object identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<u64>,
    /// Object name, possibly a regional variant.
    pub name: String,
    /// Object position.
    #[serde(default)]
    pub position: RawPosition,
}

/// The whole replay document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMatch {
    /// Player numbers grouped by team.
    #[serde(default)]
    pub teams: Vec<Vec<u32>>,
    /// Ranked match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated: Option<bool>,
    /// Game speed label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    /// Dataset label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    /// Starting age label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_age: Option<String>,
    /// Match length.
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Seconds>,
    /// When the match was played (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Game-side actions.
    #[serde(default)]
    pub actions: Vec<RawEvent>,
    /// Player inputs.
    #[serde(default)]
    pub inputs: Vec<RawEvent>,
    /// Map terrain.
    #[serde(default)]
    pub map: RawMap,
    /// Neutral objects.
    #[serde(default)]
    pub gaia: Vec<RawGaiaObject>,
    /// Players and placeholder entries.
    #[serde(default)]
    pub players: Vec<PlayerSlot>,
}

impl RawMatch {
    /// The real players, in document order.
    pub fn players(&self) -> impl Iterator<Item = &RawPlayer> {
        self.players.iter().filter_map(|slot| match slot {
            PlayerSlot::Player(player) => Some(player),
            PlayerSlot::Other(_) => None,
        })
    }

    /// End of the match: the recorded duration, or the last action or input
    /// if the duration is missing.
    #[must_use]
    pub fn end_of_game(&self) -> Option<Seconds> {
        self.duration.or_else(|| {
            self.actions
                .iter()
                .chain(&self.inputs)
                .filter_map(|e| e.timestamp)
                .reduce(f64::max)
        })
    }

    /// Cleaned-up inputs of one player, in timestamp order. Inputs without a
    /// usable timestamp are dropped with a warning.
    #[must_use]
    pub fn player_events(&self, player: u32, diagnostics: &mut Diagnostics) -> Vec<MatchEvent> {
        let mut events: Vec<MatchEvent> = self
            .inputs
            .iter()
            .filter(|raw| raw.player == Some(player))
            .filter_map(|raw| {
                let event = MatchEvent::from_raw(raw);
                if event.is_none() {
                    diagnostics.warn(
                        WarningKind::MissingTimestamp,
                        format!("player {player} {} input has no usable timestamp", raw.event_type),
                    );
                }
                event
            })
            .collect();
        events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        debug!(player, count = events.len(), "Sliced player inputs");
        events
    }
}

/// One player input, ready for analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    /// Time since match start.
    pub timestamp: Seconds,
    /// Input type.
    pub event_type: EventType,
    /// Entity acted upon; empty when the parser gave none.
    pub param: String,
    /// Issuing player.
    pub player: u32,
    /// Units or buildings the input was issued to.
    pub object_ids: Vec<u64>,
    /// Target position.
    pub position: Option<Position>,
    /// Payload building name.
    pub building: Option<String>,
    /// Wall segment end.
    pub wall_end: Option<Position>,
    /// Units requested by one click.
    pub amount: u32,
}

impl MatchEvent {
    /// Create an event with no payload.
    #[must_use]
    pub fn new(timestamp: Seconds, event_type: EventType, param: impl Into<String>, player: u32) -> Self {
        Self {
            timestamp,
            event_type,
            param: param.into(),
            player,
            object_ids: Vec::new(),
            position: None,
            building: None,
            wall_end: None,
            amount: 1,
        }
    }

    /// Set the object ids.
    #[must_use]
    pub fn with_object_ids(mut self, ids: &[u64]) -> Self {
        self.object_ids = ids.to_vec();
        self
    }

    /// Set the target position.
    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    /// Set the payload building name.
    #[must_use]
    pub fn with_building(mut self, building: impl Into<String>) -> Self {
        self.building = Some(building.into());
        self
    }

    /// Set the wall segment end.
    #[must_use]
    pub fn with_wall_end(mut self, x: f64, y: f64) -> Self {
        self.wall_end = Some(Position::new(x, y));
        self
    }

    /// Set the queue amount.
    #[must_use]
    pub fn with_amount(mut self, amount: u32) -> Self {
        self.amount = amount;
        self
    }

    /// Build from a raw record. `None` if the timestamp or player is missing.
    #[must_use]
    pub fn from_raw(raw: &RawEvent) -> Option<Self> {
        let timestamp = raw.timestamp?;
        let player = raw.player?;
        let wall_end = match (raw.payload.x_end, raw.payload.y_end) {
            (Some(x), Some(y)) => Some(Position::new(x, y)),
            _ => None,
        };
        Some(Self {
            timestamp,
            event_type: raw.event_type.clone(),
            param: raw.param.clone().unwrap_or_default(),
            player,
            object_ids: raw.payload.object_ids.clone().unwrap_or_default(),
            position: raw.position.as_ref().and_then(RawPosition::resolve),
            building: raw.payload.building.clone(),
            wall_end,
            amount: raw.payload.amount.unwrap_or(1).max(1),
        })
    }

    /// Name of the building this input concerns: the payload building if
    /// present, else `param`.
    #[must_use]
    pub fn building_name(&self) -> &str {
        self.building
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(&self.param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("0:05:00"), Some(300.0));
        assert_eq!(parse_timestamp("1:00:30.500000"), Some(3630.5));
        assert_eq!(parse_timestamp("02:10"), Some(130.0));
        assert_eq!(parse_timestamp("soon"), None);
    }

    #[test]
    fn test_event_type_round_trip_names() {
        assert_eq!(EventType::from("Queue".to_string()), EventType::Queue);
        assert_eq!(
            EventType::from("Formation".to_string()),
            EventType::Other("Formation".into())
        );
        assert_eq!(String::from(EventType::Wall), "Wall");
    }

    #[test]
    fn test_raw_event_accepts_string_and_number_timestamps() {
        let json = r#"[
            {"timestamp": "0:05:00", "type": "Research", "param": "Feudal Age", "player": 1},
            {"timestamp": 12.5, "type": "Queue", "param": "Villager", "player": 1,
             "payload": {"object_ids": [7], "amount": 3}}
        ]"#;
        let events: Vec<RawEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(events[0].timestamp, Some(300.0));
        assert_eq!(events[1].timestamp, Some(12.5));
        assert_eq!(events[1].payload.amount, Some(3));
    }

    #[test]
    fn test_player_slots_skip_non_objects() {
        let json = r#"{
            "players": [
                {"number": 1, "name": "a", "civilization": "Franks", "position": {"x": 10.0, "y": 20.0}},
                {"number": 2, "name": "b", "civilization": "Mayans", "position": {}},
                3
            ]
        }"#;
        let raw: RawMatch = serde_json::from_str(json).unwrap();
        let players: Vec<_> = raw.players().collect();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].position.resolve(), Some(Position::new(10.0, 20.0)));
        assert_eq!(players[1].position.resolve(), None);
    }

    #[test]
    fn test_player_events_filters_and_sorts() {
        let json = r#"{
            "inputs": [
                {"timestamp": 50.0, "type": "Build", "param": "House", "player": 1,
                 "position": {"x": 3.0, "y": 4.0}},
                {"timestamp": 10.0, "type": "Queue", "param": "Villager", "player": 1},
                {"timestamp": 12.0, "type": "Queue", "param": "Villager", "player": 2},
                {"type": "Queue", "param": "Villager", "player": 1}
            ]
        }"#;
        let raw: RawMatch = serde_json::from_str(json).unwrap();
        let mut diagnostics = Diagnostics::new();

        let events = raw.player_events(1, &mut diagnostics);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].timestamp, 10.0);
        assert_eq!(events[1].position, Some(Position::new(3.0, 4.0)));
        assert_eq!(diagnostics.count(WarningKind::MissingTimestamp), 1);
    }

    #[test]
    fn test_end_of_game_falls_back_to_last_event() {
        let mut raw = RawMatch::default();
        raw.inputs.push(RawEvent {
            timestamp: Some(900.0),
            event_type: EventType::Queue,
            param: None,
            player: Some(1),
            position: None,
            payload: RawPayload::default(),
        });
        assert_eq!(raw.end_of_game(), Some(900.0));

        raw.duration = Some(1200.0);
        assert_eq!(raw.end_of_game(), Some(1200.0));
    }

    #[test]
    fn test_building_name_prefers_payload() {
        let event = MatchEvent::new(1.0, EventType::Wall, "Wall", 1).with_building("Palisade Wall");
        assert_eq!(event.building_name(), "Palisade Wall");

        let event = MatchEvent::new(1.0, EventType::Build, "Farm", 1);
        assert_eq!(event.building_name(), "Farm");
    }
}

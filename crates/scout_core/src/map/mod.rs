//! Map feature engine.
//!
//! Resource objects are snapped to tiles, grouped into islands per
//! category, marked as inside or outside the corridor between the two
//! bases, and handed to the nearer player. Each player's share is then
//! classified as front, front hill or back.

pub mod classify;
pub mod corridor;
pub mod islands;
pub mod tiles;

pub use classify::{assign_players, classify_player, PlayerMapFeatures, ResourcePlacement, WoodlineCounts};
pub use corridor::Corridor;
pub use islands::{assign_islands, label_islands};
pub use tiles::{fold_resource_name, ingest_resources, ElevationMap, ResourceCategory, ResourceTile, TileCoord};

use tracing::debug;

use crate::config::MapConfig;
use crate::diagnostics::{Diagnostics, WarningKind};
use crate::replay::{Position, RawGaiaObject, RawMap};

/// A player's number and start position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStart {
    /// Player number.
    pub player: u32,
    /// Start position, if known.
    pub position: Option<Position>,
}

/// Result of the map feature engine for one match.
#[derive(Debug, Clone)]
pub struct MapAnalysis {
    /// Labeled and assigned resource tiles.
    pub tiles: Vec<ResourceTile>,
    /// Per-player features, in the order the players were given.
    pub players: Vec<PlayerMapFeatures>,
}

/// Run the map feature engine for a two-player match.
///
/// Returns `None` with a [`WarningKind::MapAnalysisSkipped`] warning when a
/// start position is unknown or both players start on the same spot.
pub fn analyze_map(
    map: &RawMap,
    gaia: &[RawGaiaObject],
    starts: [PlayerStart; 2],
    config: &MapConfig,
    diagnostics: &mut Diagnostics,
) -> Option<MapAnalysis> {
    let [first, second] = starts;
    let (Some(first_pos), Some(second_pos)) = (first.position, second.position) else {
        diagnostics.warn(
            WarningKind::MapAnalysisSkipped,
            "start position unknown for at least one player",
        );
        return None;
    };
    let Some(corridor) = Corridor::between(first_pos, second_pos, config.corridor_half_width) else {
        diagnostics.warn(
            WarningKind::MapAnalysisSkipped,
            "both players start on the same position",
        );
        return None;
    };

    let elevation = ElevationMap::from_raw(map);
    let mut tiles = ingest_resources(gaia, &elevation, diagnostics);
    let islands = assign_islands(&mut tiles);

    let distance = first_pos.distance(&second_pos);
    let cutoff = config.assignment_cutoff(distance);
    assign_players(
        &mut tiles,
        [(first.player, first_pos), (second.player, second_pos)],
        &corridor,
        cutoff,
    );

    debug!(
        tiles = tiles.len(),
        islands = ?islands,
        distance,
        cutoff,
        "Labeled map resources"
    );

    let players = [(first.player, first_pos), (second.player, second_pos)]
        .into_iter()
        .map(|(player, start)| {
            classify_player(
                &tiles,
                player,
                elevation.base_height(start),
                config,
                diagnostics,
            )
        })
        .collect();

    Some(MapAnalysis { tiles, players })
}

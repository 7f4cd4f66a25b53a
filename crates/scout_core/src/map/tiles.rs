//! Resource tiles ingested from the gaia object list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostics, WarningKind};
use crate::replay::{Position, RawGaiaObject, RawMap};

/// Resource kinds grouped into islands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    /// Berry bushes and their regional variants.
    FruitBush,
    /// Gold.
    GoldMine,
    /// Stone.
    StoneMine,
    /// Any tree.
    Tree,
}

impl ResourceCategory {
    /// Every labeled category.
    pub const ALL: [Self; 4] = [Self::FruitBush, Self::GoldMine, Self::StoneMine, Self::Tree];

    /// Canonical object name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FruitBush => "Fruit Bush",
            Self::GoldMine => "Gold Mine",
            Self::StoneMine => "Stone Mine",
            Self::Tree => "Tree",
        }
    }

    /// Category of a folded object name.
    #[must_use]
    pub fn from_folded(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

const FOLDS: [(&[&str], &str); 4] = [
    (&["Forage Bush", "Berry Bush"], "Fruit Bush"),
    (&["Llama", "Goat", "Goose", "Turkey", "Pig"], "Sheep"),
    (&["Zebra", "Ostrich", "Ibex", "Gazelle"], "Deer"),
    (&["Elephant", "Rhinoceros"], "Wild Boar"),
];

/// Fold a regional object name into its canonical resource name.
///
/// A parenthesised suffix is dropped first, so `"Tree (Oak Forest)"` becomes
/// `"Tree"`.
#[must_use]
pub fn fold_resource_name(raw: &str) -> String {
    let base = raw.find(" (").map_or(raw, |i| &raw[..i]).trim();
    FOLDS
        .iter()
        .find(|(variants, _)| variants.contains(&base))
        .map_or_else(|| base.to_string(), |(_, canonical)| (*canonical).to_string())
}

/// Grid coordinates of one tile.
pub type TileCoord = (u32, u32);

/// Terrain height per tile.
#[derive(Debug, Clone, Default)]
pub struct ElevationMap {
    dimension: u32,
    heights: HashMap<TileCoord, f64>,
}

impl ElevationMap {
    /// Build from the map tile list. A zero dimension is inferred from the
    /// largest tile coordinate.
    #[must_use]
    pub fn from_raw(map: &RawMap) -> Self {
        let mut heights = HashMap::with_capacity(map.tiles.len());
        let mut largest = 0u32;
        for tile in &map.tiles {
            let Some(position) = tile.position.resolve() else {
                continue;
            };
            if position.x < 0.0 || position.y < 0.0 {
                continue;
            }
            let coord = (position.x as u32, position.y as u32);
            largest = largest.max(coord.0).max(coord.1);
            heights.insert(coord, tile.elevation);
        }
        let dimension = if map.dimension > 0 {
            map.dimension
        } else if heights.is_empty() {
            0
        } else {
            largest + 1
        };
        Self { dimension, heights }
    }

    /// Side length in tiles.
    #[must_use]
    pub const fn dimension(&self) -> u32 {
        self.dimension
    }

    /// Height of a tile.
    #[must_use]
    pub fn get(&self, coord: TileCoord) -> Option<f64> {
        self.heights.get(&coord).copied()
    }

    /// Tile containing `position`, if it is on the map.
    #[must_use]
    pub fn tile_of(&self, position: Position) -> Option<TileCoord> {
        let (x, y) = (position.x.trunc(), position.y.trunc());
        let limit = f64::from(self.dimension);
        if x < 0.0 || y < 0.0 || x >= limit || y >= limit {
            return None;
        }
        Some((x as u32, y as u32))
    }

    /// Height under a player's start position, 0 when unknown. Heights are
    /// whole levels, so a fractional value is truncated.
    #[must_use]
    pub fn base_height(&self, start: Position) -> f64 {
        self.tile_of(start)
            .and_then(|coord| self.get(coord))
            .map_or(0.0, f64::trunc)
    }
}

/// One resource object on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTile {
    /// Tile X.
    pub x: u32,
    /// Tile Y.
    pub y: u32,
    /// Folded object name.
    pub name: String,
    /// Labeled category, if any.
    pub category: Option<ResourceCategory>,
    /// Terrain height, 0 if the map did not list the tile.
    pub elevation: f64,
    /// Gaia object id.
    pub instance_id: Option<u64>,
    /// Island within its category.
    pub island: Option<usize>,
    /// Inside the corridor between the bases.
    pub between_players: bool,
    /// Nearer player, if within the assignment cutoff.
    pub closest_player: Option<u32>,
}

impl ResourceTile {
    /// Grid coordinates.
    #[must_use]
    pub const fn coord(&self) -> TileCoord {
        (self.x, self.y)
    }

    /// Tile coordinates as a map position.
    #[must_use]
    pub fn position(&self) -> Position {
        Position::new(f64::from(self.x), f64::from(self.y))
    }
}

/// Turn the gaia list into resource tiles.
///
/// Objects without a position or outside the map are dropped with a single
/// [`WarningKind::MapData`] warning.
pub fn ingest_resources(
    gaia: &[RawGaiaObject],
    elevation: &ElevationMap,
    diagnostics: &mut Diagnostics,
) -> Vec<ResourceTile> {
    let mut dropped = 0usize;
    let mut tiles = Vec::with_capacity(gaia.len());

    for object in gaia {
        let Some(coord) = object
            .position
            .resolve()
            .and_then(|p| elevation.tile_of(p))
        else {
            dropped += 1;
            continue;
        };
        let name = fold_resource_name(&object.name);
        tiles.push(ResourceTile {
            x: coord.0,
            y: coord.1,
            category: ResourceCategory::from_folded(&name),
            name,
            elevation: elevation.get(coord).unwrap_or(0.0),
            instance_id: object.instance_id,
            island: None,
            between_players: false,
            closest_player: None,
        });
    }

    if dropped > 0 {
        diagnostics.warn(
            WarningKind::MapData,
            format!("{dropped} map object(s) without a position on the map were skipped"),
        );
    }
    tiles
}

//! Player assignment and per-player resource classification.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::MapConfig;
use crate::diagnostics::{Diagnostics, WarningKind};
use crate::features::{FeatureRow, FeatureValue};
use crate::replay::Position;

use super::corridor::Corridor;
use super::tiles::{ResourceCategory, ResourceTile, TileCoord};

/// Where a resource sits relative to the enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourcePlacement {
    /// Forward and higher than the player's base.
    FrontHill,
    /// Forward.
    Front,
    /// Behind or beside the base.
    Back,
}

impl ResourcePlacement {
    /// Label used in feature rows.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FrontHill => "Front Hill",
            Self::Front => "Front",
            Self::Back => "Back",
        }
    }

    /// Classify a group of tiles. `None` for an empty group.
    #[must_use]
    pub fn of(tiles: &[&ResourceTile], base_height: f64) -> Option<Self> {
        if tiles.is_empty() {
            return None;
        }
        if !tiles.iter().any(|t| t.between_players) {
            return Some(Self::Back);
        }
        let mean = tiles.iter().map(|t| t.elevation).sum::<f64>() / tiles.len() as f64;
        Some(if mean > base_height {
            Self::FrontHill
        } else {
            Self::Front
        })
    }
}

/// Woodline counts by exposure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WoodlineCounts {
    /// Mostly inside the corridor.
    pub front: usize,
    /// Partly inside the corridor.
    pub side: usize,
    /// Mostly outside the corridor.
    pub back: usize,
}

/// Map features of one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMapFeatures {
    /// Player number.
    pub player: u32,
    /// Largest gold island.
    pub main_gold: Option<ResourcePlacement>,
    /// Second-largest gold island.
    pub second_gold: Option<ResourcePlacement>,
    /// Third-largest gold island.
    pub third_gold: Option<ResourcePlacement>,
    /// All berry bushes.
    pub berries: Option<ResourcePlacement>,
    /// Largest stone island.
    pub stone: Option<ResourcePlacement>,
    /// Woodlines by exposure.
    pub woodlines: WoodlineCounts,
}

impl PlayerMapFeatures {
    /// Flatten into `MapFeatures` keys (without the player prefix).
    #[must_use]
    pub fn to_features(&self) -> FeatureRow {
        let mut row = FeatureRow::new();
        for (key, placement) in [
            ("MainGold", self.main_gold),
            ("SecondGold", self.second_gold),
            ("ThirdGold", self.third_gold),
            ("Berries", self.berries),
            ("Stone", self.stone),
        ] {
            row.insert(key, FeatureValue::text(placement.as_ref().map(ResourcePlacement::label)));
        }
        row.insert("FrontWoodlines", self.woodlines.front);
        row.insert("SideWoodlines", self.woodlines.side);
        row.insert("BackWoodlines", self.woodlines.back);
        row
    }
}

/// Mark corridor tiles and give each tile to the nearer player within the
/// cutoff. Equal distances go to the first player listed.
pub fn assign_players(
    tiles: &mut [ResourceTile],
    starts: [(u32, Position); 2],
    corridor: &Corridor,
    cutoff: f64,
) {
    for tile in tiles.iter_mut() {
        let position = tile.position();
        tile.between_players = corridor.contains(position);

        let [(first, first_start), (second, second_start)] = starts;
        let d1 = position.distance(&first_start);
        let d2 = position.distance(&second_start);
        let (player, distance) = if d1 <= d2 { (first, d1) } else { (second, d2) };
        tile.closest_player = (distance < cutoff).then_some(player);
    }
}

/// Classify the resources assigned to `player`.
pub fn classify_player(
    tiles: &[ResourceTile],
    player: u32,
    base_height: f64,
    config: &MapConfig,
    diagnostics: &mut Diagnostics,
) -> PlayerMapFeatures {
    let owned: Vec<&ResourceTile> = tiles
        .iter()
        .filter(|t| t.closest_player == Some(player))
        .collect();

    let golds = islands_by_size(&owned, ResourceCategory::GoldMine);
    let gold_at = |rank: usize| {
        golds
            .get(rank)
            .and_then(|island| ResourcePlacement::of(island, base_height))
    };

    let berries: Vec<&ResourceTile> = owned
        .iter()
        .copied()
        .filter(|t| t.category == Some(ResourceCategory::FruitBush))
        .collect();

    let stone = islands_by_size(&owned, ResourceCategory::StoneMine)
        .first()
        .and_then(|island| ResourcePlacement::of(island, base_height));

    PlayerMapFeatures {
        player,
        main_gold: gold_at(0),
        second_gold: gold_at(1),
        third_gold: gold_at(2),
        berries: ResourcePlacement::of(&berries, base_height),
        stone,
        woodlines: count_woodlines(&owned, player, config, diagnostics),
    }
}

/// Islands of one category among `tiles`, largest first. Ties keep the
/// lower island id first.
fn islands_by_size<'a>(
    tiles: &[&'a ResourceTile],
    category: ResourceCategory,
) -> Vec<Vec<&'a ResourceTile>> {
    let mut by_island: BTreeMap<usize, Vec<&ResourceTile>> = BTreeMap::new();
    for tile in tiles.iter().copied().filter(|t| t.category == Some(category)) {
        if let Some(island) = tile.island {
            by_island.entry(island).or_default().push(tile);
        }
    }
    let mut islands: Vec<Vec<&ResourceTile>> = by_island.into_values().collect();
    islands.sort_by(|a, b| b.len().cmp(&a.len()));
    islands
}

fn count_woodlines(
    owned: &[&ResourceTile],
    player: u32,
    config: &MapConfig,
    diagnostics: &mut Diagnostics,
) -> WoodlineCounts {
    let mut by_island: BTreeMap<usize, BTreeMap<TileCoord, bool>> = BTreeMap::new();
    let mut duplicates = BTreeSet::new();
    for tile in owned.iter().filter(|t| t.category == Some(ResourceCategory::Tree)) {
        let Some(island) = tile.island else {
            continue;
        };
        let woodline = by_island.entry(island).or_default();
        if woodline.insert(tile.coord(), tile.between_players).is_some() {
            duplicates.insert(island);
        }
    }
    if !duplicates.is_empty() {
        diagnostics.warn(
            WarningKind::MapData,
            format!(
                "player {player}: {} woodline(s) listed the same tree tile twice; duplicates collapsed",
                duplicates.len()
            ),
        );
    }

    let mut counts = WoodlineCounts::default();
    for woodline in by_island.values() {
        let total = woodline.len();
        if total < config.min_woodline_tiles {
            continue;
        }
        let forward = woodline.values().filter(|between| **between).count();
        let ratio = forward as f64 / total as f64;
        if ratio >= config.front_woodline_ratio {
            counts.front += 1;
        } else if ratio >= config.side_woodline_ratio {
            counts.side += 1;
        } else {
            counts.back += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(x: u32, y: u32, category: ResourceCategory, island: usize) -> ResourceTile {
        ResourceTile {
            x,
            y,
            name: category.name().to_string(),
            category: Some(category),
            elevation: 0.0,
            instance_id: None,
            island: Some(island),
            between_players: false,
            closest_player: Some(1),
        }
    }

    #[test]
    fn test_placement_rules() {
        let mut front = tile(0, 0, ResourceCategory::GoldMine, 0);
        front.between_players = true;
        front.elevation = 2.0;
        let back = tile(1, 0, ResourceCategory::GoldMine, 0);

        assert_eq!(ResourcePlacement::of(&[&front, &back], 0.0), Some(ResourcePlacement::FrontHill));
        assert_eq!(ResourcePlacement::of(&[&front, &back], 1.0), Some(ResourcePlacement::Front));
        assert_eq!(ResourcePlacement::of(&[&back], 0.0), Some(ResourcePlacement::Back));
        assert_eq!(ResourcePlacement::of(&[], 0.0), None);
    }

    #[test]
    fn test_assignment_cutoff_and_tie() {
        let corridor =
            Corridor::between(Position::new(10.0, 50.0), Position::new(90.0, 50.0), 25.0).unwrap();
        let mut tiles = vec![
            tile(50, 50, ResourceCategory::Tree, 0),
            tile(15, 50, ResourceCategory::Tree, 1),
            tile(85, 95, ResourceCategory::Tree, 2),
        ];
        assign_players(
            &mut tiles,
            [(1, Position::new(10.0, 50.0)), (2, Position::new(90.0, 50.0))],
            &corridor,
            41.0,
        );
        assert_eq!(tiles[0].closest_player, Some(1));
        assert!(tiles[0].between_players);
        assert_eq!(tiles[1].closest_player, Some(1));
        assert_eq!(tiles[2].closest_player, None);
        assert!(!tiles[2].between_players);
    }

    #[test]
    fn test_gold_ranking_and_stone() {
        let mut tiles = vec![
            tile(0, 0, ResourceCategory::GoldMine, 0),
            tile(10, 0, ResourceCategory::GoldMine, 1),
            tile(10, 1, ResourceCategory::GoldMine, 1),
            tile(20, 0, ResourceCategory::StoneMine, 0),
            tile(30, 0, ResourceCategory::StoneMine, 1),
            tile(30, 1, ResourceCategory::StoneMine, 1),
        ];
        tiles[0].between_players = true;
        tiles[3].between_players = true;
        let mut diagnostics = Diagnostics::new();

        let features = classify_player(&tiles, 1, 0.0, &MapConfig::default(), &mut diagnostics);
        assert_eq!(features.main_gold, Some(ResourcePlacement::Back));
        assert_eq!(features.second_gold, Some(ResourcePlacement::Front));
        assert_eq!(features.third_gold, None);
        assert_eq!(features.stone, Some(ResourcePlacement::Back));
        assert_eq!(features.berries, None);

        let row = features.to_features();
        assert!(row.get("ThirdGold").unwrap().is_missing());
        assert_eq!(row.get("MainGold").unwrap().as_text(), Some("Back"));
    }

    #[test]
    fn test_woodline_ratios() {
        let mut tiles = Vec::new();
        // 5 tiles, 3 forward: front.
        for i in 0..5 {
            let mut t = tile(i, 0, ResourceCategory::Tree, 0);
            t.between_players = i < 3;
            tiles.push(t);
        }
        // 5 tiles, 1 forward: side.
        for i in 0..5 {
            let mut t = tile(i, 10, ResourceCategory::Tree, 1);
            t.between_players = i == 0;
            tiles.push(t);
        }
        // Straggler pair ignored.
        tiles.push(tile(40, 40, ResourceCategory::Tree, 2));
        tiles.push(tile(41, 40, ResourceCategory::Tree, 2));
        // Back woodline with a duplicated tile.
        for i in 0..4 {
            tiles.push(tile(i, 30, ResourceCategory::Tree, 3));
        }
        tiles.push(tile(0, 30, ResourceCategory::Tree, 3));
        let mut diagnostics = Diagnostics::new();

        let features = classify_player(&tiles, 1, 0.0, &MapConfig::default(), &mut diagnostics);
        assert_eq!(
            features.woodlines,
            WoodlineCounts {
                front: 1,
                side: 1,
                back: 1
            }
        );
        assert_eq!(diagnostics.count(WarningKind::MapData), 1);
    }
}

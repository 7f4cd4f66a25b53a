//! Connected-component labeling of resource tiles.
//!
//! Two tiles touch if they differ by at most one step in each direction
//! (8-connectivity). Labels are assigned by flood fill from the smallest
//! unvisited coordinate, so the result does not depend on the order the
//! tiles were listed in.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::tiles::{ResourceCategory, ResourceTile, TileCoord};

const NEIGHBORS: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Group coordinates into islands. Each island is sorted and islands are
/// ordered by their smallest coordinate.
#[must_use]
pub fn label_islands(coords: impl IntoIterator<Item = TileCoord>) -> Vec<Vec<TileCoord>> {
    let occupied: BTreeSet<TileCoord> = coords.into_iter().collect();
    let mut visited: BTreeSet<TileCoord> = BTreeSet::new();
    let mut islands = Vec::new();

    for &start in &occupied {
        if !visited.insert(start) {
            continue;
        }
        let mut island = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some((x, y)) = queue.pop_front() {
            island.push((x, y));
            for (dx, dy) in NEIGHBORS {
                let nx = i64::from(x) + dx;
                let ny = i64::from(y) + dy;
                let (Ok(nx), Ok(ny)) = (u32::try_from(nx), u32::try_from(ny)) else {
                    continue;
                };
                let next = (nx, ny);
                if occupied.contains(&next) && visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        island.sort_unstable();
        islands.push(island);
    }

    islands
}

/// Label every categorised tile with its island id within the category.
/// Returns the number of islands per category.
pub fn assign_islands(tiles: &mut [ResourceTile]) -> BTreeMap<ResourceCategory, usize> {
    let mut counts = BTreeMap::new();
    for category in ResourceCategory::ALL {
        let islands = label_islands(
            tiles
                .iter()
                .filter(|t| t.category == Some(category))
                .map(ResourceTile::coord),
        );
        let island_of: BTreeMap<TileCoord, usize> = islands
            .iter()
            .enumerate()
            .flat_map(|(id, island)| island.iter().map(move |coord| (*coord, id)))
            .collect();
        for tile in tiles.iter_mut().filter(|t| t.category == Some(category)) {
            tile.island = island_of.get(&tile.coord()).copied();
        }
        counts.insert(category, islands.len());
    }
    counts
}

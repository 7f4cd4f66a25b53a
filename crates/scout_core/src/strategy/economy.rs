//! Economic development milestones.

use crate::age::Seconds;
use crate::replay::EventType;

use super::timeline::PlayerTimeline;

/// Farm counts at which the completion time is recorded.
pub const FARM_MILESTONES: [(usize, &str); 5] = [
    (3, "TimeThreeFarms"),
    (6, "TimeSixFarms"),
    (10, "TimeTenFarms"),
    (15, "TimeFifteenFarms"),
    (20, "TimeTwentyFarms"),
];

const PALISADE: &str = "Palisade Wall";

/// Economy features of one player.
#[derive(Debug, Clone, PartialEq)]
pub struct EconomyStats {
    /// Double-Bit Axe completion.
    pub double_bit_axe: Option<Seconds>,
    /// Horse Collar completion.
    pub horse_collar: Option<Seconds>,
    /// Wheelbarrow completion.
    pub wheelbarrow: Option<Seconds>,
    /// Farms placed in the feudal age.
    pub feudal_farms: usize,
    /// Completion of the nth feudal farm, in [`FARM_MILESTONES`] order.
    pub farm_milestones: [Option<Seconds>; 5],
    /// Palisade tiles placed before Feudal Age.
    pub dark_age_walls: u64,
    /// Palisade tiles placed between Feudal and Castle Age.
    pub feudal_walls: u64,
    /// Palisade tiles placed after Castle Age.
    pub post_castle_walls: u64,
    /// Houses placed in the feudal age.
    pub feudal_houses: usize,
    /// Castle Age completion.
    pub castle_time: Option<Seconds>,
    /// Imperial Age completion.
    pub imperial_time: Option<Seconds>,
}

/// Length of a wall segment in tiles.
#[must_use]
pub fn wall_tiles(start: (f64, f64), end: (f64, f64)) -> u64 {
    let span = (start.0 - end.0).abs().max((start.1 - end.1).abs());
    span.round() as u64
}

/// Compute the economy features.
///
/// The feudal window is open at both ends: a farm placed exactly when
/// Feudal Age finished is still a dark-age farm.
#[must_use]
pub fn economy_stats(timeline: &PlayerTimeline, castle_bound: Seconds) -> EconomyStats {
    let feudal = timeline.ages.feudal;
    let in_feudal = |clicked_at: Seconds| feudal.is_some_and(|f| clicked_at > f && clicked_at < castle_bound);

    let mut farm_completions: Vec<Seconds> = timeline
        .buildings_named("Farm")
        .filter(|b| in_feudal(b.clicked_at))
        .map(|b| b.completed_at)
        .collect();
    farm_completions.sort_by(f64::total_cmp);

    let mut farm_milestones = [None; 5];
    for (slot, (count, _)) in farm_milestones.iter_mut().zip(FARM_MILESTONES) {
        *slot = farm_completions.get(count - 1).copied();
    }

    let feudal_houses = timeline
        .buildings_named("House")
        .filter(|b| in_feudal(b.clicked_at))
        .count();

    let (mut dark_age_walls, mut feudal_walls, mut post_castle_walls) = (0, 0, 0);
    let feudal_bound = feudal.unwrap_or(f64::INFINITY);
    for event in timeline
        .events
        .iter()
        .filter(|e| e.event_type == EventType::Wall && e.building_name() == PALISADE)
    {
        let (Some(start), Some(end)) = (event.position, event.wall_end) else {
            continue;
        };
        let tiles = wall_tiles((start.x, start.y), (end.x, end.y));
        if event.timestamp < feudal_bound {
            dark_age_walls += tiles;
        } else if event.timestamp <= castle_bound {
            feudal_walls += tiles;
        } else {
            post_castle_walls += tiles;
        }
    }

    EconomyStats {
        double_bit_axe: timeline.tech_time("Double-Bit Axe"),
        horse_collar: timeline.tech_time("Horse Collar"),
        wheelbarrow: timeline.tech_time("Wheelbarrow"),
        feudal_farms: farm_completions.len(),
        farm_milestones,
        dark_age_walls,
        feudal_walls,
        post_castle_walls,
        feudal_houses,
        castle_time: timeline.ages.castle,
        imperial_time: timeline.ages.imperial,
    }
}

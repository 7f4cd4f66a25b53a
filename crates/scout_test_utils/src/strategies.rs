//! Proptest strategies shared across crates.

use proptest::prelude::*;

use scout_core::replay::{EventType, MatchEvent};

/// Request times for one production queue, unsorted.
pub fn arb_request_times(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..3000.0, 0..max_len)
}

/// Production duration in seconds.
pub fn arb_duration() -> impl Strategy<Value = f64> {
    1.0f64..200.0
}

/// Resource tile coordinates on a small map.
pub fn arb_tile_coords(dimension: u32, max_len: usize) -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((0..dimension, 0..dimension), 0..max_len)
}

/// A point near the origin in tile units.
pub fn arb_point(extent: f64) -> impl Strategy<Value = (f64, f64)> {
    (-extent..extent, -extent..extent)
}

/// A villager queue input at one of a few town centre ids.
pub fn arb_villager_queue() -> impl Strategy<Value = MatchEvent> {
    (0.0f64..1200.0, 1u64..3).prop_map(|(at, id)| {
        MatchEvent::new(at, EventType::Queue, "Villager", 1).with_object_ids(&[id])
    })
}

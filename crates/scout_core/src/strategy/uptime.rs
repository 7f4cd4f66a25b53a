//! Dark-age villager estimate.

use crate::age::Seconds;
use crate::config::VillagerConfig;
use crate::data::ReferenceData;

use super::timeline::PlayerTimeline;

/// How a player left the dark age.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UptimeStats {
    /// Feudal Age completion.
    pub feudal_time: Option<Seconds>,
    /// Villagers at the moment Feudal Age was clicked.
    pub villagers: Option<u32>,
    /// Loom finished before Feudal Age.
    pub dark_age_loom: bool,
}

/// Estimate the villager count at the feudal click.
///
/// The town centre is assumed to have produced villagers without idle time
/// until the age-up was clicked, and loom researched in the dark age is
/// taken out of that window.
#[must_use]
pub fn uptime_stats(
    timeline: &PlayerTimeline,
    reference: &ReferenceData,
    villagers: &VillagerConfig,
) -> UptimeStats {
    let civ = timeline.civilization.as_str();
    let feudal_time = timeline.ages.feudal;
    let loom = timeline.tech_time("Loom");
    let dark_age_loom = match (loom, feudal_time) {
        (Some(loom), Some(feudal)) => loom < feudal,
        (Some(_), None) => true,
        _ => false,
    };

    let estimate = feudal_time.and_then(|feudal| {
        let feudal_research = reference.technologies.duration("Feudal Age", civ, None)?;
        let mut production_window = feudal - feudal_research;
        if dark_age_loom {
            production_window -= reference.technologies.duration("Loom", civ, None).unwrap_or(0.0);
        }
        let cadence = villagers.cadence_for(civ);
        if cadence <= 0.0 {
            return None;
        }
        let produced = (production_window.max(0.0) / cadence).floor() as u32;
        Some(produced + villagers.starting_for(civ))
    });

    UptimeStats {
        feudal_time,
        villagers: estimate,
        dark_age_loom,
    }
}

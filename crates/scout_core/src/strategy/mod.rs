//! Player strategy extraction.
//!
//! A [`PlayerTimeline`] turns one player's inputs into completion times.
//! The extractors in this module read the timeline and the age boundaries
//! derived from it:
//!
//! - [`uptime`]: villager estimate at the feudal click and dark-age loom
//! - [`militia`]: dark-age infantry pressure
//! - [`feudal`]: first feudal military building and unit mix
//! - [`decision`]: the rule table that names the opening
//! - [`economy`]: farms, walls, houses and eco upgrades
//!
//! [`PlayerOpeningProfile`] bundles the results and flattens them into the
//! `OpeningStrategy` feature group.

pub mod decision;
pub mod economy;
pub mod feudal;
pub mod militia;
pub mod timeline;
pub mod uptime;

pub use decision::{classify_opening, OpeningFeatures, Pattern, Rule, RULES, UNIDENTIFIED};
pub use economy::{economy_stats, EconomyStats, FARM_MILESTONES};
pub use feudal::{feudal_stats, FeudalStats, OpeningBuilding};
pub use militia::{militia_stats, MilitiaStats, MilitiaStrategy};
pub use timeline::{dedupe_inputs, CompletedBuilding, PlayerInfo, PlayerTimeline};
pub use uptime::{uptime_stats, UptimeStats};

use tracing::debug;

use crate::age::Seconds;
use crate::config::AnalysisConfig;
use crate::data::ReferenceData;
use crate::diagnostics::{Diagnostics, WarningKind};
use crate::features::{FeatureRow, FeatureValue};

/// Everything derived about one player's opening.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOpeningProfile {
    /// Player number.
    pub player: u32,
    /// Dark-age villager estimate.
    pub uptime: UptimeStats,
    /// Infantry opening.
    pub militia: MilitiaStats,
    /// Feudal military opening.
    pub feudal: FeudalStats,
    /// Opening name from the decision table.
    pub strategy: String,
    /// Economic development.
    pub economy: EconomyStats,
}

impl PlayerOpeningProfile {
    /// Run every extractor over a reconstructed timeline.
    ///
    /// `end_of_game` bounds the feudal window when the player never reached
    /// Castle Age.
    pub fn extract(
        timeline: &PlayerTimeline,
        reference: &ReferenceData,
        config: &AnalysisConfig,
        end_of_game: Option<Seconds>,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let castle_bound = timeline
            .ages
            .castle
            .or(end_of_game)
            .unwrap_or(f64::INFINITY);

        let uptime = uptime_stats(timeline, reference, &config.villagers);
        let militia = militia_stats(timeline, &reference.catalog, castle_bound);
        let feudal = feudal_stats(timeline, &reference.catalog, castle_bound);
        let economy = economy_stats(timeline, castle_bound);

        let features = OpeningFeatures {
            militia: militia.strategy,
            building: feudal.opening_building,
            archers: feudal.count("Archer") > 0,
            skirmishers: feudal.count("Skirmisher") > 0,
            scouts: feudal.count("Scout Cavalry") > 0,
            late_feudal: uptime
                .feudal_time
                .is_some_and(|t| t > config.strategy.late_feudal_threshold),
        };
        let strategy = match classify_opening(&features) {
            Some(label) => label.to_string(),
            None => {
                diagnostics.warn(
                    WarningKind::UnidentifiedStrategy,
                    format!(
                        "no opening rule for player {}: militia={}, building={}, archers={}, skirmishers={}, scouts={}, late_feudal={}",
                        timeline.player,
                        features.militia.map_or("none", |m| m.label()),
                        features.building,
                        features.archers,
                        features.skirmishers,
                        features.scouts,
                        features.late_feudal,
                    ),
                );
                UNIDENTIFIED.to_string()
            }
        };

        debug!(player = timeline.player, strategy = %strategy, "Classified opening");

        Self {
            player: timeline.player,
            uptime,
            militia,
            feudal,
            strategy,
            economy,
        }
    }

    /// Flatten into `OpeningStrategy` feature keys (without the player
    /// prefix).
    #[must_use]
    pub fn to_features(&self) -> FeatureRow {
        let mut row = FeatureRow::new();

        row.insert("FeudalTime", FeatureValue::seconds(self.uptime.feudal_time));
        row.insert(
            "Villagers",
            self.uptime.villagers.map_or(FeatureValue::Missing, FeatureValue::from),
        );
        row.insert("DarkAgeLoom", self.uptime.dark_age_loom);

        row.insert("FirstBarracksTime", FeatureValue::seconds(self.militia.first_barracks));
        row.insert(
            "MilitiaStrategyIdentified",
            FeatureValue::text(self.militia.strategy.map(|m| m.label())),
        );
        row.insert("NumberOfMilitiaUnits", self.militia.dark_age_units);
        row.insert("PreMillBarracks", self.militia.pre_mill_barracks);

        row.insert("OpeningMilitaryBuilding", self.feudal.opening_building.label());
        row.insert(
            "OpeningMilitaryBuildingTime",
            FeatureValue::seconds(self.feudal.opening_time),
        );
        for (unit, count) in &self.feudal.unit_counts {
            row.insert(unit.replace(' ', ""), *count);
        }
        row.insert("OpeningStrategy", self.strategy.as_str());

        let economy = &self.economy;
        row.insert("DoubleBitAxe", FeatureValue::seconds(economy.double_bit_axe));
        row.insert("HorseCollar", FeatureValue::seconds(economy.horse_collar));
        row.insert("Wheelbarrow", FeatureValue::seconds(economy.wheelbarrow));
        row.insert("NumberFeudalFarms", economy.feudal_farms);
        for ((_, key), at) in FARM_MILESTONES.iter().zip(economy.farm_milestones) {
            row.insert(*key, FeatureValue::seconds(at));
        }
        row.insert("DarkAgeWallsNumber", wall_value(economy.dark_age_walls));
        row.insert("FeudalWallsNumber", wall_value(economy.feudal_walls));
        row.insert("PostCastleWalls", wall_value(economy.post_castle_walls));
        row.insert("FeudalHousesBuilt", economy.feudal_houses);
        row.insert("CastleTime", FeatureValue::seconds(economy.castle_time));
        row.insert("ImperialTime", FeatureValue::seconds(economy.imperial_time));

        row
    }
}

fn wall_value(tiles: u64) -> FeatureValue {
    FeatureValue::Int(i64::try_from(tiles).unwrap_or(i64::MAX))
}

//! One match in, one feature row out.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::data::ReferenceData;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{AnalysisError, Result};
use crate::features::{FeatureRow, FeatureValue};
use crate::map::{analyze_map, PlayerStart};
use crate::parser::{JsonReplayParser, ReplayParser};
use crate::replay::{RawMatch, RawPlayer};
use crate::strategy::{PlayerInfo, PlayerOpeningProfile, PlayerTimeline};

/// Feature row and warnings of one analysed match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// File name or other label of the match.
    pub label: String,
    /// Flat feature row.
    pub features: FeatureRow,
    /// Data-quality warnings raised along the way.
    pub warnings: Vec<Warning>,
}

/// Runs the whole pipeline for a match.
///
/// Cheap to clone; reference data and configuration are shared.
#[derive(Debug, Clone)]
pub struct MatchAnalyzer {
    reference: Arc<ReferenceData>,
    config: Arc<AnalysisConfig>,
}

impl MatchAnalyzer {
    /// Create an analyzer.
    #[must_use]
    pub fn new(reference: Arc<ReferenceData>, config: Arc<AnalysisConfig>) -> Self {
        Self { reference, config }
    }

    /// Analyzer with the built-in tables and default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidReferenceData`] if the built-in
    /// tables fail validation.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(
            Arc::new(ReferenceData::builtin()?),
            Arc::new(AnalysisConfig::default()),
        ))
    }

    /// Reference tables in use.
    #[must_use]
    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Read, parse and analyse a replay JSON file.
    ///
    /// # Errors
    ///
    /// Returns the parse error, or any match-level error of
    /// [`MatchAnalyzer::analyze`].
    pub fn analyze_file(&self, path: &Path) -> Result<MatchReport> {
        let raw = JsonReplayParser::new().parse_file(path)?;
        let label = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.analyze(&raw, &label)
    }

    /// Analyse a parsed replay.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::MissingPlayers`] for fewer than two players
    /// and [`AnalysisError::NoTownCentre`] when a player's timeline cannot
    /// be anchored.
    pub fn analyze(&self, raw: &RawMatch, label: &str) -> Result<MatchReport> {
        let mut diagnostics = Diagnostics::for_match(label);
        let players: Vec<&RawPlayer> = raw.players().collect();
        if players.len() < 2 {
            return Err(AnalysisError::MissingPlayers {
                found: players.len(),
            });
        }

        let end_of_game = raw.end_of_game();
        let mut row = FeatureRow::new();

        for player in &players {
            let start = player.position.resolve();
            let events = raw.player_events(player.number, &mut diagnostics);
            let timeline = PlayerTimeline::build(
                PlayerInfo {
                    number: player.number,
                    civilization: &player.civilization,
                    start,
                },
                events,
                &self.reference,
                &self.config,
                &mut diagnostics,
            )?;
            let profile = PlayerOpeningProfile::extract(
                &timeline,
                &self.reference,
                &self.config,
                end_of_game,
                &mut diagnostics,
            );

            let prefix = format!("Player{}.", player.number);
            row.extend_prefixed(&format!("{prefix}OpeningStrategy."), profile.to_features());
            row.extend_prefixed(&format!("{prefix}MapAndCiv."), map_and_civ(player));
        }

        let (first, second) = (players[0], players[1]);
        let starts = [
            PlayerStart {
                player: first.number,
                position: first.position.resolve(),
            },
            PlayerStart {
                player: second.number,
                position: second.position.resolve(),
            },
        ];

        if self.config.include_map_analysis {
            if let Some(map) = analyze_map(
                &raw.map,
                &raw.gaia,
                starts,
                &self.config.map,
                &mut diagnostics,
            ) {
                for features in map.players {
                    row.extend_prefixed(
                        &format!("Player{}.MapFeatures.", features.player),
                        features.to_features(),
                    );
                }
            }
        } else {
            debug!(replay = label, "Map analysis disabled");
        }

        let distance = match (starts[0].position, starts[1].position) {
            (Some(a), Some(b)) => FeatureValue::Float(a.distance(&b)),
            _ => FeatureValue::Missing,
        };
        row.insert("DistanceBetweenPlayers", distance);
        row.insert("DifferenceInELO", elo_difference(first, second));
        row.extend_prefixed("Match.", match_metadata(raw));

        let warnings = diagnostics.into_warnings();
        info!(
            replay = label,
            features = row.len(),
            warnings = warnings.len(),
            "Analysed match"
        );

        Ok(MatchReport {
            label: label.to_string(),
            features: row,
            warnings,
        })
    }
}

fn map_and_civ(player: &RawPlayer) -> FeatureRow {
    let mut row = FeatureRow::new();
    row.insert("Civilisation", player.civilization.as_str());
    row.insert("Name", player.name.as_str());
    row.insert(
        "StartingLocation",
        player
            .position
            .resolve()
            .map_or(FeatureValue::Missing, FeatureValue::from),
    );
    row.insert("Winner", player.winner.map_or(FeatureValue::Missing, FeatureValue::from));
    row.insert(
        "Elo",
        player.rate_snapshot.map_or(FeatureValue::Missing, FeatureValue::Float),
    );
    row
}

/// Winner's rating minus loser's rating.
fn elo_difference(first: &RawPlayer, second: &RawPlayer) -> FeatureValue {
    let (winner, loser) = match (first.winner, second.winner) {
        (Some(true), _) => (first, second),
        (_, Some(true)) => (second, first),
        _ => return FeatureValue::Missing,
    };
    match (winner.rate_snapshot, loser.rate_snapshot) {
        (Some(w), Some(l)) => FeatureValue::Float(w - l),
        _ => FeatureValue::Missing,
    }
}

fn match_metadata(raw: &RawMatch) -> FeatureRow {
    let mut row = FeatureRow::new();
    row.insert("MapName", FeatureValue::text(raw.map.name.as_deref()));
    row.insert("Rated", raw.rated.map_or(FeatureValue::Missing, FeatureValue::from));
    row.insert("Speed", FeatureValue::text(raw.speed.as_deref()));
    row.insert("Dataset", FeatureValue::text(raw.dataset.as_deref()));
    row.insert("StartingAge", FeatureValue::text(raw.starting_age.as_deref()));
    row.insert("Duration", FeatureValue::seconds(raw.duration));
    row
}

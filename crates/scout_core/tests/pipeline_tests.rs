//! End-to-end tests of the match pipeline.
//!
//! Replays are assembled with the shared fixtures, serialized to the JSON
//! the external parser produces, parsed back and analysed.

use std::sync::Arc;

use scout_core::prelude::*;
use scout_test_utils::fixtures::{build, gaia, palisade, queue, research, standard_match, ReplayBuilder};

fn analyze(builder: &ReplayBuilder) -> MatchReport {
    let raw = JsonReplayParser::new()
        .parse_str(&builder.to_json(), "fixture.json")
        .expect("fixture parses");
    MatchAnalyzer::with_defaults()
        .expect("builtin reference data is valid")
        .analyze(&raw, "fixture.json")
        .expect("fixture analyses")
}

fn feature<'a>(report: &'a MatchReport, key: &str) -> &'a FeatureValue {
    report
        .features
        .get(key)
        .unwrap_or_else(|| panic!("feature {key} missing"))
}

// ==========================================================================
// Opening timeline
// ==========================================================================

#[test]
fn test_feudal_time_is_last_click_plus_research() {
    let replay = standard_match().with_inputs([
        queue(0.0, 1, "Villager", 1),
        research(280.0, 1, "Feudal Age", 1),
        research(300.0, 1, "Feudal Age", 1),
    ]);

    let report = analyze(&replay);

    assert_eq!(
        feature(&report, "Player1.OpeningStrategy.FeudalTime"),
        &FeatureValue::Seconds(430.0)
    );
    assert!(feature(&report, "Player2.OpeningStrategy.FeudalTime").is_missing());
}

#[test]
fn test_no_feudal_farms_leaves_milestones_missing() {
    let replay = standard_match().with_inputs([research(300.0, 1, "Feudal Age", 1)]);

    let report = analyze(&replay);

    assert_eq!(
        feature(&report, "Player1.OpeningStrategy.NumberFeudalFarms"),
        &FeatureValue::Int(0)
    );
    for key in ["TimeThreeFarms", "TimeSixFarms", "TimeTwentyFarms"] {
        assert!(
            feature(&report, &format!("Player1.OpeningStrategy.{key}")).is_missing(),
            "{key} should be missing"
        );
    }
}

#[test]
fn test_straight_archers_end_to_end() {
    let replay = standard_match().with_inputs([
        research(470.0, 1, "Feudal Age", 1),
        build(610.0, 1, "Archery Range", 30.0, 60.0, 3),
        queue(650.0, 1, "Archer", 500),
        queue(680.0, 1, "Archer", 500),
    ]);

    let report = analyze(&replay);

    assert_eq!(
        feature(&report, "Player1.OpeningStrategy.FeudalTime"),
        &FeatureValue::Seconds(600.0)
    );
    assert_eq!(
        feature(&report, "Player1.OpeningStrategy.OpeningMilitaryBuilding").as_text(),
        Some("Archery Range")
    );
    assert_eq!(
        feature(&report, "Player1.OpeningStrategy.Archer"),
        &FeatureValue::Int(2)
    );
    assert_eq!(
        feature(&report, "Player1.OpeningStrategy.OpeningStrategy").as_text(),
        Some("Straight Archers")
    );
}

#[test]
fn test_dark_age_walls_counted_in_tiles() {
    let replay = standard_match().with_inputs([
        palisade(200.0, 1, (10.0, 10.0), (15.0, 10.0)),
        research(300.0, 1, "Feudal Age", 1),
        palisade(500.0, 1, (10.0, 12.0), (10.0, 15.0)),
    ]);

    let report = analyze(&replay);

    assert_eq!(
        feature(&report, "Player1.OpeningStrategy.DarkAgeWallsNumber"),
        &FeatureValue::Int(5)
    );
    assert_eq!(
        feature(&report, "Player1.OpeningStrategy.FeudalWallsNumber"),
        &FeatureValue::Int(3)
    );
}

// ==========================================================================
// Map features
// ==========================================================================

#[test]
fn test_map_features_relative_to_each_base() {
    let replay = standard_match()
        .with_terrain(|x, _| if (38..=43).contains(&x) { 3.0 } else { 1.0 })
        .with_gaia([
            gaia("Gold Mine", 40.0, 60.0),
            gaia("Gold Mine", 41.0, 60.0),
            gaia("Forage Bush", 10.0, 60.0),
            gaia("Forage Bush", 11.0, 60.0),
            gaia("Stone Mine", 15.0, 40.0),
        ])
        .with_gaia((50..56).map(|y| gaia("Tree (Oak Forest)", 5.0, f64::from(y))));

    let report = analyze(&replay);

    let text = |key: &str| feature(&report, key).as_text().map(str::to_string);
    assert_eq!(text("Player1.MapFeatures.MainGold").as_deref(), Some("Front Hill"));
    assert_eq!(text("Player1.MapFeatures.Berries").as_deref(), Some("Back"));
    assert_eq!(text("Player1.MapFeatures.Stone").as_deref(), Some("Back"));
    assert!(feature(&report, "Player1.MapFeatures.SecondGold").is_missing());
    assert_eq!(
        feature(&report, "Player1.MapFeatures.BackWoodlines"),
        &FeatureValue::Int(1)
    );
    assert!(feature(&report, "Player2.MapFeatures.MainGold").is_missing());
    assert_eq!(
        feature(&report, "DistanceBetweenPlayers"),
        &FeatureValue::Float(80.0)
    );
}

#[test]
fn test_map_analysis_can_be_disabled() {
    let raw = standard_match()
        .with_gaia([gaia("Gold Mine", 40.0, 60.0)])
        .build();
    let analyzer = MatchAnalyzer::new(
        Arc::new(ReferenceData::builtin().unwrap()),
        Arc::new(AnalysisConfig::default().with_map_analysis(false)),
    );

    let report = analyzer.analyze(&raw, "no-map.json").unwrap();

    assert!(report.features.keys().all(|k| !k.contains(".MapFeatures.")));
    assert!(report.features.get("Player1.OpeningStrategy.FeudalTime").is_some());
}

// ==========================================================================
// Document shape
// ==========================================================================

#[test]
fn test_placeholder_slots_are_ignored() {
    let replay = standard_match().with_placeholder();

    let report = analyze(&replay);

    assert!(report.features.keys().all(|k| !k.starts_with("Player3")));
    assert_eq!(
        feature(&report, "Player2.MapAndCiv.Civilisation").as_text(),
        Some("Franks")
    );
    assert_eq!(feature(&report, "Match.MapName").as_text(), Some("Arabia"));
    assert_eq!(feature(&report, "Match.Duration"), &FeatureValue::Seconds(1800.0));
}

#[test]
fn test_one_player_is_a_match_level_error() {
    let raw = ReplayBuilder::new(60)
        .with_player(scout_test_utils::fixtures::player(1, "Britons", 10.0, 10.0))
        .with_placeholder()
        .build();

    let err = MatchAnalyzer::with_defaults()
        .unwrap()
        .analyze(&raw, "solo.json")
        .unwrap_err();

    assert!(matches!(err, AnalysisError::MissingPlayers { found: 1 }));
    assert!(err.is_match_level());
}

#[test]
fn test_report_serializes_to_json() {
    let report = analyze(&standard_match());

    let json = serde_json::to_string(&report).unwrap();
    let back: MatchReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.label, "fixture.json");
    assert_eq!(back.features.len(), report.features.len());
}

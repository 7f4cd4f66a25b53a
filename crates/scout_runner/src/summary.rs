//! Aggregate statistics over a batch of analysed matches.

use std::collections::BTreeMap;

use scout_core::analysis::MatchReport;
use scout_core::diagnostics::WarningKind;
use serde::{Deserialize, Serialize};

use crate::batch::{BatchError, BatchResults};

/// Per-player key suffixes averaged in the summary.
const AGE_KEYS: [(&str, &str); 3] = [
    ("Feudal Age", ".OpeningStrategy.FeudalTime"),
    ("Castle Age", ".OpeningStrategy.CastleTime"),
    ("Imperial Age", ".OpeningStrategy.ImperialTime"),
];

const STRATEGY_SUFFIX: &str = ".OpeningStrategy.OpeningStrategy";
const CIVILIZATION_SUFFIX: &str = ".MapAndCiv.Civilisation";

/// Mean and count of one age-up time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgeUpStats {
    /// Players who reached the age.
    pub players: usize,
    /// Mean time in seconds; 0 when nobody reached it.
    pub mean_seconds: f64,
    /// Earliest time.
    pub min_seconds: Option<f64>,
    /// Latest time.
    pub max_seconds: Option<f64>,
}

impl AgeUpStats {
    fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        Self {
            players: samples.len(),
            mean_seconds: samples.iter().sum::<f64>() / samples.len() as f64,
            min_seconds: samples.iter().copied().reduce(f64::min),
            max_seconds: samples.iter().copied().reduce(f64::max),
        }
    }
}

/// Summary of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches analysed successfully.
    pub matches_analyzed: usize,
    /// Matches that failed.
    pub matches_failed: usize,
    /// Player openings by label.
    pub strategy_counts: BTreeMap<String, usize>,
    /// Player openings by civilization, then label.
    pub strategy_by_civilization: BTreeMap<String, BTreeMap<String, usize>>,
    /// Age-up times by age name.
    pub age_ups: BTreeMap<String, AgeUpStats>,
    /// Warnings by kind over all matches.
    pub warnings_by_kind: BTreeMap<WarningKind, usize>,
}

impl BatchSummary {
    /// Summarise successful reports and failures.
    #[must_use]
    pub fn from_reports(reports: &[MatchReport], errors: &[BatchError]) -> Self {
        let mut summary = Self {
            matches_analyzed: reports.len(),
            matches_failed: errors.len(),
            ..Default::default()
        };
        let mut age_samples: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

        for report in reports {
            for warning in &report.warnings {
                *summary.warnings_by_kind.entry(warning.kind).or_default() += 1;
            }

            for (key, value) in report.features.iter() {
                if let Some(player) = key.strip_suffix(STRATEGY_SUFFIX) {
                    let Some(label) = value.as_text() else {
                        continue;
                    };
                    *summary.strategy_counts.entry(label.to_string()).or_default() += 1;

                    let civilization = report
                        .features
                        .get(&format!("{player}{CIVILIZATION_SUFFIX}"))
                        .and_then(|v| v.as_text())
                        .unwrap_or("Unknown");
                    *summary
                        .strategy_by_civilization
                        .entry(civilization.to_string())
                        .or_default()
                        .entry(label.to_string())
                        .or_default() += 1;
                }

                for (age, suffix) in AGE_KEYS {
                    if key.ends_with(suffix) {
                        if let Some(seconds) = value.as_f64() {
                            age_samples.entry(age).or_default().push(seconds);
                        }
                    }
                }
            }
        }

        summary.age_ups = AGE_KEYS
            .iter()
            .map(|(age, _)| {
                let samples = age_samples.get(age).map_or(&[][..], Vec::as_slice);
                ((*age).to_string(), AgeUpStats::from_samples(samples))
            })
            .collect();
        summary
    }

    /// Openings sorted by frequency, most common first.
    #[must_use]
    pub fn strategies_by_frequency(&self) -> Vec<(&str, usize)> {
        let mut sorted: Vec<(&str, usize)> = self
            .strategy_counts
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        sorted
    }
}

fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Render a batch as a markdown report.
#[must_use]
pub fn to_markdown(results: &BatchResults) -> String {
    let summary = &results.summary;
    let mut md = String::new();
    md.push_str("# Opening Strategy Report\n\n");

    let players: usize = summary.strategy_counts.values().sum();
    md.push_str("## Openings\n\n");
    md.push_str("| Opening | Players | Share |\n|---------|---------|-------|\n");
    for (label, count) in summary.strategies_by_frequency() {
        md.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            label,
            count,
            count as f64 / players.max(1) as f64 * 100.0
        ));
    }

    md.push_str("\n## Age-Up Times\n\n");
    md.push_str("| Age | Players | Mean | Earliest | Latest |\n|-----|---------|------|----------|--------|\n");
    for (age, _) in AGE_KEYS {
        let stats = summary.age_ups.get(age).copied().unwrap_or_default();
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            age,
            stats.players,
            if stats.players == 0 {
                "-".to_string()
            } else {
                format_time(stats.mean_seconds)
            },
            stats.min_seconds.map_or_else(|| "-".to_string(), format_time),
            stats.max_seconds.map_or_else(|| "-".to_string(), format_time),
        ));
    }

    if !summary.strategy_by_civilization.is_empty() {
        md.push_str("\n## Openings by Civilization\n\n");
        for (civilization, counts) in &summary.strategy_by_civilization {
            let list: Vec<String> = counts
                .iter()
                .map(|(label, count)| format!("{label} ({count})"))
                .collect();
            md.push_str(&format!("- **{}**: {}\n", civilization, list.join(", ")));
        }
    }

    if !summary.warnings_by_kind.is_empty() {
        md.push_str("\n## Warnings\n\n");
        for (kind, count) in &summary.warnings_by_kind {
            md.push_str(&format!("- {:?}: {}\n", kind, count));
        }
    }

    if !results.errors.is_empty() {
        md.push_str("\n## Failed Matches\n\n");
        for error in &results.errors {
            md.push_str(&format!("- `{}`: {}\n", error.path, error.message));
        }
    }

    md.push_str(&format!(
        "\n---\n*Analyzed {} matches, {} failed*\n",
        summary.matches_analyzed, summary.matches_failed
    ));
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::diagnostics::Warning;
    use scout_core::features::{FeatureRow, FeatureValue};

    fn create_test_report(openings: &[(&str, &str, Option<f64>)]) -> MatchReport {
        let mut features = FeatureRow::new();
        for (i, (civ, opening, feudal)) in openings.iter().enumerate() {
            let player = format!("Player{}", i + 1);
            features.insert(format!("{player}.MapAndCiv.Civilisation"), *civ);
            features.insert(format!("{player}{STRATEGY_SUFFIX}"), *opening);
            features.insert(
                format!("{player}.OpeningStrategy.FeudalTime"),
                FeatureValue::seconds(*feudal),
            );
        }
        MatchReport {
            label: "test.json".to_string(),
            features,
            warnings: vec![Warning {
                kind: WarningKind::UnknownEntity,
                message: "x".to_string(),
            }],
        }
    }

    #[test]
    fn test_summary_counts_openings_and_age_ups() {
        let reports = vec![
            create_test_report(&[("Franks", "Scouts", Some(600.0)), ("Mayans", "Drush FC", Some(700.0))]),
            create_test_report(&[("Franks", "Scouts", Some(620.0)), ("Britons", "Unidentified", None)]),
        ];
        let errors = vec![BatchError {
            path: "bad.json".to_string(),
            message: "no town centre".to_string(),
        }];

        let summary = BatchSummary::from_reports(&reports, &errors);

        assert_eq!(summary.matches_analyzed, 2);
        assert_eq!(summary.matches_failed, 1);
        assert_eq!(summary.strategy_counts["Scouts"], 2);
        assert_eq!(summary.strategy_by_civilization["Franks"]["Scouts"], 2);
        assert_eq!(summary.strategies_by_frequency()[0], ("Scouts", 2));

        let feudal = summary.age_ups["Feudal Age"];
        assert_eq!(feudal.players, 3);
        assert!((feudal.mean_seconds - 640.0).abs() < 1e-9);
        assert_eq!(feudal.min_seconds, Some(600.0));
        assert_eq!(summary.age_ups["Castle Age"].players, 0);
        assert_eq!(summary.warnings_by_kind[&WarningKind::UnknownEntity], 2);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(430.0), "7:10");
        assert_eq!(format_time(59.6), "1:00");
    }
}

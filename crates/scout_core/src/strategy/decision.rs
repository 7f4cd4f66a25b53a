//! Ordered rule table that names a player's opening.
//!
//! Rules are checked top to bottom and the first match wins. Some later
//! rules are unreachable because an earlier, more general rule covers them;
//! they are kept so the table reads the same as the strategy catalogue it
//! encodes.

use super::feudal::OpeningBuilding;
use super::militia::MilitiaStrategy;
use Pattern::{Any, Is};

/// Label for feature tuples no rule covers.
pub const UNIDENTIFIED: &str = "Unidentified";

/// One position of a rule: either a wildcard or an exact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern<T> {
    /// Matches anything.
    Any,
    /// Matches exactly this value.
    Is(T),
}

impl<T: PartialEq> Pattern<T> {
    /// Whether `value` fits the pattern.
    #[must_use]
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::Any => true,
            Self::Is(expected) => expected == value,
        }
    }
}

/// The inputs of the decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningFeatures {
    /// Infantry opening.
    pub militia: Option<MilitiaStrategy>,
    /// First feudal military building.
    pub building: OpeningBuilding,
    /// Any archers before Castle Age.
    pub archers: bool,
    /// Any skirmishers before Castle Age.
    pub skirmishers: bool,
    /// Any scouts before Castle Age.
    pub scouts: bool,
    /// Feudal Age reached after the late-feudal threshold.
    pub late_feudal: bool,
}

/// A row of the decision table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    militia: Pattern<Option<MilitiaStrategy>>,
    building: Pattern<OpeningBuilding>,
    archers: Pattern<bool>,
    skirmishers: Pattern<bool>,
    scouts: Pattern<bool>,
    late_feudal: Pattern<bool>,
    label: &'static str,
}

impl Rule {
    /// Label emitted when the rule matches.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Whether the rule covers `features`.
    #[must_use]
    pub fn matches(&self, features: &OpeningFeatures) -> bool {
        self.militia.matches(&features.militia)
            && self.building.matches(&features.building)
            && self.archers.matches(&features.archers)
            && self.skirmishers.matches(&features.skirmishers)
            && self.scouts.matches(&features.scouts)
            && self.late_feudal.matches(&features.late_feudal)
    }
}

const DRUSH: Pattern<Option<MilitiaStrategy>> = Is(Some(MilitiaStrategy::Drush));
const PRE_MILL: Pattern<Option<MilitiaStrategy>> = Is(Some(MilitiaStrategy::PreMillDrush));
const MAA: Pattern<Option<MilitiaStrategy>> = Is(Some(MilitiaStrategy::ManAtArms));
const RANGE: Pattern<OpeningBuilding> = Is(OpeningBuilding::ArcheryRange);
const STABLE: Pattern<OpeningBuilding> = Is(OpeningBuilding::Stable);
const YES: Pattern<bool> = Is(true);
const NO: Pattern<bool> = Is(false);

const fn rule(
    militia: Pattern<Option<MilitiaStrategy>>,
    building: Pattern<OpeningBuilding>,
    archers: Pattern<bool>,
    skirmishers: Pattern<bool>,
    scouts: Pattern<bool>,
    late_feudal: Pattern<bool>,
    label: &'static str,
) -> Rule {
    Rule {
        militia,
        building,
        archers,
        skirmishers,
        scouts,
        late_feudal,
        label,
    }
}

/// The opening table in evaluation order.
pub const RULES: [Rule; 17] = [
    rule(DRUSH, RANGE, Any, Any, Any, YES, "Drush FC"),
    rule(DRUSH, RANGE, Any, Any, Any, NO, "Drush Flush"),
    rule(PRE_MILL, RANGE, Any, Any, Any, YES, "Pre-Mill Drush FC"),
    rule(PRE_MILL, RANGE, Any, Any, Any, NO, "Pre-Mill Drush Flush"),
    rule(MAA, RANGE, Any, Any, Any, Any, "MAA Archers"),
    rule(MAA, Any, Any, Any, Any, Any, "MAA"),
    rule(Any, RANGE, YES, YES, YES, Any, "Archery Range into Full Feudal"),
    rule(Any, STABLE, YES, YES, YES, Any, "Scouts into Full Feudal"),
    rule(Any, STABLE, NO, NO, YES, Any, "Full Scouts"),
    rule(Any, RANGE, YES, YES, Any, Any, "Archers and Skirms"),
    rule(Any, RANGE, YES, Any, YES, Any, "Archers into scouts"),
    rule(Any, RANGE, YES, Any, YES, Any, "Skirms into scouts"),
    rule(Any, STABLE, YES, Any, Any, Any, "Scouts into archers"),
    rule(Any, STABLE, Any, YES, Any, Any, "Scouts into skirms"),
    rule(Any, RANGE, YES, NO, NO, Any, "Straight Archers"),
    rule(Any, RANGE, NO, YES, NO, Any, "Straight Skirms or Trash Rush"),
    rule(Any, Any, Any, Any, Any, YES, "Fast Castle"),
];

/// Index of the first rule covering `features`.
#[must_use]
pub fn matching_rule(features: &OpeningFeatures) -> Option<usize> {
    RULES.iter().position(|r| r.matches(features))
}

/// Name the opening, or `None` if no rule covers it.
#[must_use]
pub fn classify_opening(features: &OpeningFeatures) -> Option<&'static str> {
    matching_rule(features).map(|i| RULES[i].label())
}

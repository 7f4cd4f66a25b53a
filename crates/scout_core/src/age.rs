//! Match phases and the timestamps that separate them.

use serde::{Deserialize, Serialize};

/// Seconds since the start of a match. Negative values are allowed for the
/// synthetic construction of the starting town centre.
pub type Seconds = f64;

/// A match phase, advanced by researching an age-up technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Age {
    /// Starting age.
    Dark,
    /// Reached by researching "Feudal Age".
    Feudal,
    /// Reached by researching "Castle Age".
    Castle,
    /// Reached by researching "Imperial Age".
    Imperial,
}

impl Age {
    /// All ages in match order.
    pub const ALL: [Self; 4] = [Self::Dark, Self::Feudal, Self::Castle, Self::Imperial];

    /// Get the display name for this age.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Dark => "Dark Age",
            Self::Feudal => "Feudal Age",
            Self::Castle => "Castle Age",
            Self::Imperial => "Imperial Age",
        }
    }

    /// The technology that advances a player into this age.
    #[must_use]
    pub const fn age_up_tech(&self) -> Option<&'static str> {
        match self {
            Self::Dark => None,
            Self::Feudal => Some("Feudal Age"),
            Self::Castle => Some("Castle Age"),
            Self::Imperial => Some("Imperial Age"),
        }
    }

    /// Parse an age from its display name or short name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        let short = lowered.strip_suffix(" age").unwrap_or(&lowered);
        match short {
            "dark" => Some(Self::Dark),
            "feudal" => Some(Self::Feudal),
            "castle" => Some(Self::Castle),
            "imperial" => Some(Self::Imperial),
            _ => None,
        }
    }
}

impl std::fmt::Display for Age {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Age-up completion times of one player. `None` means the age was never
/// reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgeTimes {
    /// Feudal Age reached.
    pub feudal: Option<Seconds>,
    /// Castle Age reached.
    pub castle: Option<Seconds>,
    /// Imperial Age reached.
    pub imperial: Option<Seconds>,
}

impl AgeTimes {
    /// Create age times from the three age-up completions.
    #[must_use]
    pub const fn new(
        feudal: Option<Seconds>,
        castle: Option<Seconds>,
        imperial: Option<Seconds>,
    ) -> Self {
        Self {
            feudal,
            castle,
            imperial,
        }
    }

    /// When the given age was reached. The dark age starts at 0.
    #[must_use]
    pub const fn reached(&self, age: Age) -> Option<Seconds> {
        match age {
            Age::Dark => Some(0.0),
            Age::Feudal => self.feudal,
            Age::Castle => self.castle,
            Age::Imperial => self.imperial,
        }
    }

    /// The age a player was in at `time`. An age counts from strictly after
    /// its age-up completion.
    #[must_use]
    pub fn age_at(&self, time: Seconds) -> Age {
        let mut age = Age::Dark;
        for (candidate, reached) in [
            (Age::Feudal, self.feudal),
            (Age::Castle, self.castle),
            (Age::Imperial, self.imperial),
        ] {
            if reached.is_some_and(|t| time > t) {
                age = candidate;
            }
        }
        age
    }
}

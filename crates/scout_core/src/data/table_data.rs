//! Serialized form of a reference table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::age::{Age, Seconds};

/// On-disk form of one timing table.
///
/// # Example RON
///
/// ```ron
/// (
///     entries: { "Town Center": 150.0, "Castle": 200.0 },
///     age_overrides: [
///         (entity: "Town Center", civilization: "Cumans", age: Feudal, seconds: 270.0),
///     ],
///     civ_overrides: [
///         (entity: "Castle", civilization: "Sicilians", seconds: 133.33),
///     ],
///     rate_modifiers: [
///         (civilization: "Spanish", divisor: 1.30),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTableData {
    /// Base duration per entity display name.
    pub entries: BTreeMap<String, Seconds>,

    /// Full replacements that only apply in one age.
    #[serde(default)]
    pub age_overrides: Vec<AgeOverride>,

    /// Full replacements for one civilization.
    #[serde(default)]
    pub civ_overrides: Vec<CivOverride>,

    /// Civilization-wide speed bonuses.
    #[serde(default)]
    pub rate_modifiers: Vec<RateModifier>,
}

/// Duration replacement for an (entity, civilization, age) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeOverride {
    /// Entity display name.
    pub entity: String,
    /// Civilization name.
    pub civilization: String,
    /// Age in which the override holds.
    pub age: Age,
    /// Replacement duration.
    pub seconds: Seconds,
}

/// Duration replacement for an (entity, civilization) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CivOverride {
    /// Entity display name.
    pub entity: String,
    /// Civilization name.
    pub civilization: String,
    /// Replacement duration.
    pub seconds: Seconds,
}

/// Divides the base duration of matching entities for one civilization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateModifier {
    /// Civilization name.
    pub civilization: String,

    /// Speed factor; the base duration is divided by it.
    pub divisor: f64,

    /// Entities the bonus applies to. Empty means every entity.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<String>,

    /// Entities excluded from the bonus.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub except: Vec<String>,
}

impl RateModifier {
    /// Create a modifier that applies to every entity.
    #[must_use]
    pub fn new(civilization: impl Into<String>, divisor: f64) -> Self {
        Self {
            civilization: civilization.into(),
            divisor,
            entities: Vec::new(),
            except: Vec::new(),
        }
    }

    /// Restrict the modifier to the given entities.
    #[must_use]
    pub fn with_entities(mut self, entities: &[&str]) -> Self {
        self.entities = entities.iter().map(|e| (*e).to_string()).collect();
        self
    }

    /// Exclude entities from the modifier.
    #[must_use]
    pub fn with_except(mut self, except: &[&str]) -> Self {
        self.except = except.iter().map(|e| (*e).to_string()).collect();
        self
    }
}

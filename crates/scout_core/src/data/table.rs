//! Validated lookup table built from [`ReferenceTableData`].

use std::collections::{HashMap, HashSet};

use super::normalize_entity_name;
use super::table_data::ReferenceTableData;
use crate::age::{Age, Seconds};
use crate::diagnostics::{Diagnostics, WarningKind};
use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone)]
struct CompiledModifier {
    divisor: f64,
    entities: HashSet<String>,
    except: HashSet<String>,
}

impl CompiledModifier {
    fn applies_to(&self, key: &str) -> bool {
        (self.entities.is_empty() || self.entities.contains(key)) && !self.except.contains(key)
    }
}

/// One timing table (buildings, technologies or units) with its override
/// rules resolved into keyed maps.
///
/// [`duration`](Self::duration) resolves in a fixed order and exactly one
/// path applies:
///
/// 1. an age override for (entity, civilization, age),
/// 2. a civilization override for (entity, civilization),
/// 3. the civilization's rate modifier, if it covers the entity,
/// 4. the base duration.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    name: String,
    base: HashMap<String, Seconds>,
    age_overrides: HashMap<(String, String, Age), Seconds>,
    civ_overrides: HashMap<(String, String), Seconds>,
    rate_modifiers: HashMap<String, CompiledModifier>,
    data: ReferenceTableData,
}

impl ReferenceTable {
    /// Validate table data and build the lookup maps.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidReferenceData`] if a duration is
    /// negative or not finite, a divisor is not positive, two entries fold to
    /// the same key, an override names an unknown entity, an override key is
    /// repeated, or a civilization has more than one rate modifier.
    pub fn from_data(name: impl Into<String>, data: ReferenceTableData) -> Result<Self> {
        let name = name.into();
        let invalid = |message: String| AnalysisError::InvalidReferenceData {
            source_name: name.clone(),
            message,
        };

        let mut base = HashMap::with_capacity(data.entries.len());
        for (entity, &seconds) in &data.entries {
            check_duration(seconds).map_err(|m| invalid(format!("{entity}: {m}")))?;
            let key = normalize_entity_name(entity);
            if key.is_empty() {
                return Err(invalid("entry with an empty name".to_string()));
            }
            if base.insert(key, seconds).is_some() {
                return Err(invalid(format!("'{entity}' duplicates another entry")));
            }
        }

        let known = |entity: &str| -> Result<String> {
            let key = normalize_entity_name(entity);
            if base.contains_key(&key) {
                Ok(key)
            } else {
                Err(invalid(format!("override for unknown entity '{entity}'")))
            }
        };

        let mut age_overrides = HashMap::new();
        for o in &data.age_overrides {
            check_duration(o.seconds).map_err(|m| invalid(format!("{}: {m}", o.entity)))?;
            let key = (known(&o.entity)?, normalize_entity_name(&o.civilization), o.age);
            if age_overrides.insert(key, o.seconds).is_some() {
                return Err(invalid(format!(
                    "repeated age override for '{}' / {} / {}",
                    o.entity, o.civilization, o.age
                )));
            }
        }

        let mut civ_overrides = HashMap::new();
        for o in &data.civ_overrides {
            check_duration(o.seconds).map_err(|m| invalid(format!("{}: {m}", o.entity)))?;
            let key = (known(&o.entity)?, normalize_entity_name(&o.civilization));
            if civ_overrides.insert(key, o.seconds).is_some() {
                return Err(invalid(format!(
                    "repeated civilization override for '{}' / {}",
                    o.entity, o.civilization
                )));
            }
        }

        let mut rate_modifiers = HashMap::new();
        for m in &data.rate_modifiers {
            if !(m.divisor.is_finite() && m.divisor > 0.0) {
                return Err(invalid(format!(
                    "rate divisor for {} must be positive, got {}",
                    m.civilization, m.divisor
                )));
            }
            let entities = m
                .entities
                .iter()
                .map(|e| known(e))
                .collect::<Result<HashSet<_>>>()?;
            let except = m
                .except
                .iter()
                .map(|e| known(e))
                .collect::<Result<HashSet<_>>>()?;
            let compiled = CompiledModifier {
                divisor: m.divisor,
                entities,
                except,
            };
            if rate_modifiers
                .insert(normalize_entity_name(&m.civilization), compiled)
                .is_some()
            {
                return Err(invalid(format!(
                    "more than one rate modifier for {}",
                    m.civilization
                )));
            }
        }

        Ok(Self {
            name,
            base,
            age_overrides,
            civ_overrides,
            rate_modifiers,
            data,
        })
    }

    /// Parse and validate a table from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidReferenceData`] if the text is not a
    /// valid table or fails validation.
    pub fn from_ron_str(name: impl Into<String>, text: &str) -> Result<Self> {
        let name = name.into();
        let data: ReferenceTableData =
            ron::from_str(text).map_err(|e| AnalysisError::InvalidReferenceData {
                source_name: name.clone(),
                message: e.to_string(),
            })?;
        Self::from_data(name, data)
    }

    /// Table name used in errors and warnings.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of entities in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.base.len()
    }

    /// Whether the table has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// The data the table was built from.
    #[must_use]
    pub const fn data(&self) -> &ReferenceTableData {
        &self.data
    }

    /// Whether the entity is modeled, without recording anything.
    #[must_use]
    pub fn contains(&self, entity: &str) -> bool {
        self.base.contains_key(&normalize_entity_name(entity))
    }

    /// Unmodified duration of an entity.
    #[must_use]
    pub fn base_duration(&self, entity: &str) -> Option<Seconds> {
        self.base.get(&normalize_entity_name(entity)).copied()
    }

    /// Civilization- and age-adjusted duration of an entity, or `None` when
    /// the entity is not in the table.
    #[must_use]
    pub fn duration(&self, entity: &str, civilization: &str, age: Option<Age>) -> Option<Seconds> {
        let key = normalize_entity_name(entity);
        let base = *self.base.get(&key)?;
        let civ = normalize_entity_name(civilization);

        if let Some(age) = age {
            if let Some(&seconds) = self.age_overrides.get(&(key.clone(), civ.clone(), age)) {
                return Some(seconds);
            }
        }

        let pair = (key, civ);
        if let Some(&seconds) = self.civ_overrides.get(&pair) {
            return Some(seconds);
        }

        let (key, civ) = pair;
        match self.rate_modifiers.get(&civ) {
            Some(modifier) if modifier.applies_to(&key) => Some(base / modifier.divisor),
            _ => Some(base),
        }
    }

    /// Check whether an entity is modeled.
    ///
    /// An unknown name records an [`WarningKind::UnknownEntity`] warning and
    /// returns `Ok(false)` so the caller can skip it.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::MalformedEntity`] for an empty or
    /// whitespace-only name, which only an upstream parsing fault produces.
    pub fn exists(&self, entity: &str, diagnostics: &mut Diagnostics) -> Result<bool> {
        if entity.trim().is_empty() {
            return Err(AnalysisError::MalformedEntity {
                table: self.name.clone(),
                context: "empty entity name".to_string(),
            });
        }
        if self.contains(entity) {
            Ok(true)
        } else {
            diagnostics.warn(
                WarningKind::UnknownEntity,
                format!("'{entity}' is not in the {} table", self.name),
            );
            Ok(false)
        }
    }
}

fn check_duration(seconds: Seconds) -> std::result::Result<(), String> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(format!("duration must be finite and non-negative, got {seconds}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AgeOverride, CivOverride, RateModifier};
    use proptest::prelude::*;

    fn create_test_table() -> ReferenceTable {
        let mut data = ReferenceTableData::default();
        data.entries.insert("Town Center".into(), 150.0);
        data.entries.insert("Castle".into(), 200.0);
        data.entries.insert("Feudal Age".into(), 130.0);
        data.entries.insert("Loom".into(), 25.0);
        data.age_overrides.push(AgeOverride {
            entity: "Town Center".into(),
            civilization: "Cumans".into(),
            age: Age::Feudal,
            seconds: 270.0,
        });
        data.civ_overrides.push(CivOverride {
            entity: "Castle".into(),
            civilization: "Sicilians".into(),
            seconds: 133.33,
        });
        data.rate_modifiers.push(RateModifier::new("Spanish", 1.30));
        data.rate_modifiers
            .push(RateModifier::new("Portuguese", 1.25).with_except(&["Feudal Age"]));
        ReferenceTable::from_data("test", data).unwrap()
    }

    #[test]
    fn test_base_duration_without_overrides() {
        let table = create_test_table();
        assert_eq!(table.duration("Town Center", "Franks", None), Some(150.0));
        assert_eq!(table.duration("town center", "Franks", Some(Age::Dark)), Some(150.0));
    }

    #[test]
    fn test_age_override_only_in_its_age() {
        let table = create_test_table();
        assert_eq!(table.duration("Town Center", "Cumans", Some(Age::Feudal)), Some(270.0));
        assert_eq!(table.duration("Town Center", "Cumans", Some(Age::Castle)), Some(150.0));
        assert_eq!(table.duration("Town Center", "Cumans", None), Some(150.0));
    }

    #[test]
    fn test_civ_override_replaces_base() {
        let table = create_test_table();
        assert_eq!(table.duration("Castle", "Sicilians", None), Some(133.33));
    }

    #[test]
    fn test_rate_modifier_and_exclusions() {
        let table = create_test_table();
        let spanish = table.duration("Castle", "Spanish", None).unwrap();
        assert!((spanish - 200.0 / 1.30).abs() < 1e-9);

        let loom = table.duration("Loom", "Portuguese", None).unwrap();
        assert!((loom - 20.0).abs() < 1e-9);
        assert_eq!(table.duration("Feudal Age", "Portuguese", None), Some(130.0));
    }

    #[test]
    fn test_unknown_entity_has_no_duration() {
        let table = create_test_table();
        assert_eq!(table.duration("Wonder", "Franks", None), None);
    }

    #[test]
    fn test_exists_distinguishes_empty_from_unknown() {
        let table = create_test_table();
        let mut diagnostics = Diagnostics::new();

        assert!(table.exists("Castle", &mut diagnostics).unwrap());
        assert!(!table.exists("Wonder", &mut diagnostics).unwrap());
        assert_eq!(diagnostics.count(WarningKind::UnknownEntity), 1);

        let err = table.exists("  ", &mut diagnostics).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedEntity { .. }));
    }

    #[test]
    fn test_rejects_negative_duration() {
        let mut data = ReferenceTableData::default();
        data.entries.insert("Villager".into(), -1.0);
        assert!(ReferenceTable::from_data("bad", data).is_err());
    }

    #[test]
    fn test_rejects_second_rate_modifier_for_civ() {
        let mut data = ReferenceTableData::default();
        data.entries.insert("Villager".into(), 25.0);
        data.rate_modifiers.push(RateModifier::new("Aztecs", 1.11));
        data.rate_modifiers.push(RateModifier::new("aztecs", 1.2));
        let err = ReferenceTable::from_data("bad", data).unwrap_err();
        assert!(err.to_string().contains("more than one rate modifier"));
    }

    #[test]
    fn test_rejects_override_for_unknown_entity() {
        let mut data = ReferenceTableData::default();
        data.entries.insert("Villager".into(), 25.0);
        data.civ_overrides.push(CivOverride {
            entity: "Monk".into(),
            civilization: "Aztecs".into(),
            seconds: 10.0,
        });
        assert!(ReferenceTable::from_data("bad", data).is_err());
    }

    #[test]
    fn test_rejects_names_folding_to_same_key() {
        let mut data = ReferenceTableData::default();
        data.entries.insert("Man-at-Arms".into(), 21.0);
        data.entries.insert("Man at Arms".into(), 21.0);
        assert!(ReferenceTable::from_data("bad", data).is_err());
    }

    #[test]
    fn test_rejects_zero_divisor() {
        let mut data = ReferenceTableData::default();
        data.entries.insert("Villager".into(), 25.0);
        data.rate_modifiers.push(RateModifier::new("Aztecs", 0.0));
        assert!(ReferenceTable::from_data("bad", data).is_err());
    }

    proptest! {
        #[test]
        fn prop_duration_is_repeatable(
            entity in prop::sample::select(vec!["Town Center", "Castle", "Feudal Age", "Loom", "Wonder"]),
            civilization in prop::sample::select(vec!["Cumans", "Sicilians", "Spanish", "Portuguese", "Franks", ""]),
            age in prop::option::of(prop::sample::select(vec![Age::Dark, Age::Feudal, Age::Castle, Age::Imperial])),
        ) {
            let table = create_test_table();
            let first = table.duration(entity, civilization, age);
            let second = table.duration(entity, civilization, age);
            prop_assert_eq!(first, second);
            prop_assert_eq!(first.is_some(), entity != "Wonder");
        }
    }
}

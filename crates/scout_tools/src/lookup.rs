//! Single-duration lookup.

use scout_core::age::{Age, Seconds};
use scout_core::data::{ReferenceData, TableKind};
use serde::Serialize;

use crate::error::{Result, ToolError};

/// A resolved duration and the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult {
    /// Table consulted.
    pub table: String,
    /// Entity name as given.
    pub entity: String,
    /// Civilization, if one was given.
    pub civilization: Option<String>,
    /// Age, if one was given.
    pub age: Option<Age>,
    /// Unmodified duration.
    pub base_seconds: Seconds,
    /// Duration after overrides and rate modifiers.
    pub seconds: Seconds,
}

impl std::fmt::Display for LookupResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.table, self.entity)?;
        if let Some(civ) = &self.civilization {
            write!(f, " / {civ}")?;
        }
        if let Some(age) = self.age {
            write!(f, " / {age}")?;
        }
        write!(f, ": {:.2}s", self.seconds)?;
        if (self.seconds - self.base_seconds).abs() > f64::EPSILON {
            write!(f, " (base {:.2}s)", self.base_seconds)?;
        }
        Ok(())
    }
}

/// Resolve one duration. Table and age are parsed from their command-line
/// names; no civilization means the base duration.
///
/// # Errors
///
/// Returns an error for an unknown table, age or entity.
pub fn lookup_duration(
    reference: &ReferenceData,
    table: &str,
    entity: &str,
    civilization: Option<&str>,
    age: Option<&str>,
) -> Result<LookupResult> {
    let kind = TableKind::from_name(table).ok_or_else(|| ToolError::UnknownTable(table.to_string()))?;
    let age = age
        .map(|name| Age::from_name(name).ok_or_else(|| ToolError::UnknownAge(name.to_string())))
        .transpose()?;

    let table = reference.table(kind);
    let unknown = || ToolError::UnknownEntity {
        table: kind.name().to_string(),
        entity: entity.to_string(),
    };
    let base_seconds = table.base_duration(entity).ok_or_else(unknown)?;
    let seconds = table
        .duration(entity, civilization.unwrap_or_default(), age)
        .ok_or_else(unknown)?;

    Ok(LookupResult {
        table: kind.name().to_string(),
        entity: entity.to_string(),
        civilization: civilization.map(str::to_string),
        age,
        base_seconds,
        seconds,
    })
}

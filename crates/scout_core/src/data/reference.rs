//! The full set of reference data used by one analysis run.

use std::path::Path;

use tracing::debug;

use super::catalog::ProductionCatalog;
use super::table::ReferenceTable;
use crate::age::Seconds;
use crate::error::{AnalysisError, Result};

const BUILTIN_BUILDINGS: &str = include_str!("../../data/buildings.ron");
const BUILTIN_TECHNOLOGIES: &str = include_str!("../../data/technologies.ron");
const BUILTIN_UNITS: &str = include_str!("../../data/units.ron");
const BUILTIN_PRODUCTION: &str = include_str!("../../data/production.ron");

/// Identifies one of the three timing tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Construction times.
    Buildings,
    /// Research times.
    Technologies,
    /// Training times.
    Units,
}

impl TableKind {
    /// All table kinds.
    pub const ALL: [Self; 3] = [Self::Buildings, Self::Technologies, Self::Units];

    /// File name of the table inside a reference directory.
    #[must_use]
    pub const fn file_name(&self) -> &'static str {
        match self {
            Self::Buildings => "buildings.ron",
            Self::Technologies => "technologies.ron",
            Self::Units => "units.ron",
        }
    }

    /// Short name used on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Buildings => "buildings",
            Self::Technologies => "technologies",
            Self::Units => "units",
        }
    }

    /// Parse a short name ("buildings", "techs", "units").
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "buildings" | "building" => Some(Self::Buildings),
            "technologies" | "technology" | "techs" | "tech" => Some(Self::Technologies),
            "units" | "unit" => Some(Self::Units),
            _ => None,
        }
    }

    const fn builtin_text(self) -> &'static str {
        match self {
            Self::Buildings => BUILTIN_BUILDINGS,
            Self::Technologies => BUILTIN_TECHNOLOGIES,
            Self::Units => BUILTIN_UNITS,
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Buildings, technologies, units and the production catalog.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    /// Construction times.
    pub buildings: ReferenceTable,
    /// Research times.
    pub technologies: ReferenceTable,
    /// Training times.
    pub units: ReferenceTable,
    /// What each production building can make.
    pub catalog: ProductionCatalog,
}

impl ReferenceData {
    /// Reference data compiled into the library.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidReferenceData`] if a built-in table
    /// fails validation.
    pub fn builtin() -> Result<Self> {
        Self::from_ron_strs(
            BUILTIN_BUILDINGS,
            BUILTIN_TECHNOLOGIES,
            BUILTIN_UNITS,
            BUILTIN_PRODUCTION,
        )
    }

    /// Built-in RON text of one table, for export.
    #[must_use]
    pub const fn builtin_text(kind: TableKind) -> &'static str {
        kind.builtin_text()
    }

    /// Built-in RON text of the production catalog.
    #[must_use]
    pub const fn builtin_catalog_text() -> &'static str {
        BUILTIN_PRODUCTION
    }

    /// Parse and validate all four files from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidReferenceData`] if any file fails to
    /// parse or validate, or if the catalog names an entity that is neither a
    /// unit nor a technology.
    pub fn from_ron_strs(
        buildings: &str,
        technologies: &str,
        units: &str,
        production: &str,
    ) -> Result<Self> {
        let catalog: ProductionCatalog =
            ron::from_str(production).map_err(|e| AnalysisError::InvalidReferenceData {
                source_name: "production.ron".to_string(),
                message: e.to_string(),
            })?;

        Self::from_parts(
            ReferenceTable::from_ron_str(TableKind::Buildings.file_name(), buildings)?,
            ReferenceTable::from_ron_str(TableKind::Technologies.file_name(), technologies)?,
            ReferenceTable::from_ron_str(TableKind::Units.file_name(), units)?,
            catalog,
        )
    }

    /// Assemble reference data from validated tables and check the catalog
    /// against them.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidReferenceData`] if the catalog names
    /// an entity missing from both the unit and technology tables.
    pub fn from_parts(
        buildings: ReferenceTable,
        technologies: ReferenceTable,
        units: ReferenceTable,
        catalog: ProductionCatalog,
    ) -> Result<Self> {
        if let Some(missing) = catalog
            .all_entities()
            .find(|e| !units.contains(e) && !technologies.contains(e))
        {
            return Err(AnalysisError::InvalidReferenceData {
                source_name: "production.ron".to_string(),
                message: format!("'{missing}' is neither a unit nor a technology"),
            });
        }
        if let Some(missing) = catalog
            .military_buildings
            .iter()
            .find(|b| !buildings.contains(b))
        {
            return Err(AnalysisError::InvalidReferenceData {
                source_name: "production.ron".to_string(),
                message: format!("military building '{missing}' is not in the buildings table"),
            });
        }

        Ok(Self {
            buildings,
            technologies,
            units,
            catalog,
        })
    }

    /// Load reference files from a directory. A file that is not present in
    /// the directory falls back to its built-in copy.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Io`] if a present file cannot be read, or
    /// [`AnalysisError::InvalidReferenceData`] if any table fails
    /// validation.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let read = |file_name: &str, builtin: &'static str| -> Result<String> {
            let path = dir.join(file_name);
            if path.is_file() {
                debug!("Loading reference table from {:?}", path);
                std::fs::read_to_string(&path).map_err(|e| AnalysisError::Io {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            } else {
                debug!("{:?} not found, using built-in {}", path, file_name);
                Ok(builtin.to_string())
            }
        };

        let buildings = read(TableKind::Buildings.file_name(), BUILTIN_BUILDINGS)?;
        let technologies = read(TableKind::Technologies.file_name(), BUILTIN_TECHNOLOGIES)?;
        let units = read(TableKind::Units.file_name(), BUILTIN_UNITS)?;
        let production = read("production.ron", BUILTIN_PRODUCTION)?;

        Self::from_ron_strs(&buildings, &technologies, &units, &production)
    }

    /// One of the three timing tables.
    #[must_use]
    pub const fn table(&self, kind: TableKind) -> &ReferenceTable {
        match kind {
            TableKind::Buildings => &self.buildings,
            TableKind::Technologies => &self.technologies,
            TableKind::Units => &self.units,
        }
    }

    /// Bind a civilization for production-duration lookups.
    #[must_use]
    pub const fn for_civilization<'a>(&'a self, civilization: &'a str) -> CivilizationTimings<'a> {
        CivilizationTimings {
            reference: self,
            civilization,
        }
    }
}

/// Whether a queued entry was a unit or a research.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EntryKind {
    /// Trained unit (`Queue` event).
    Unit,
    /// Researched technology (`Research` event).
    Technology,
}

/// Source of production durations for the production model.
pub trait DurationLookup {
    /// Duration of one queued entry, or `None` if it is not modeled.
    fn duration(&self, entity: &str, kind: EntryKind) -> Option<Seconds>;
}

impl<F> DurationLookup for F
where
    F: Fn(&str, EntryKind) -> Option<Seconds>,
{
    fn duration(&self, entity: &str, kind: EntryKind) -> Option<Seconds> {
        self(entity, kind)
    }
}

/// Reference data bound to one civilization.
///
/// Some names exist in both the unit and technology tables ("Man-at-Arms"
/// is a unit and its upgrade), so the entry kind picks which table is asked
/// first; the other is the fallback.
#[derive(Debug, Clone, Copy)]
pub struct CivilizationTimings<'a> {
    /// Tables to consult.
    pub reference: &'a ReferenceData,
    /// Civilization name.
    pub civilization: &'a str,
}

impl DurationLookup for CivilizationTimings<'_> {
    fn duration(&self, entity: &str, kind: EntryKind) -> Option<Seconds> {
        let (first, second) = match kind {
            EntryKind::Unit => (&self.reference.units, &self.reference.technologies),
            EntryKind::Technology => (&self.reference.technologies, &self.reference.units),
        };
        first
            .duration(entity, self.civilization, None)
            .or_else(|| second.duration(entity, self.civilization, None))
    }
}

//! Reference timing tables and production catalog.
//!
//! All tables are plain data deserialized from RON. Built-in copies live in
//! `crates/scout_core/data/` and are compiled into the library; a directory
//! of replacement files can be loaded with [`ReferenceData::load_from_dir`].
//!
//! Entity and civilization names are compared after
//! [`normalize_entity_name`], so `"Man-At-Arms"` and `"man at arms"` address
//! the same entry.

mod catalog;
mod reference;
mod table;
mod table_data;

pub use catalog::ProductionCatalog;
pub use reference::{
    CivilizationTimings, DurationLookup, EntryKind, ReferenceData, TableKind,
};
pub use table::ReferenceTable;
pub use table_data::{AgeOverride, CivOverride, RateModifier, ReferenceTableData};

/// Fold a display name into its lookup key: trimmed, lower-case, with spaces
/// and hyphens replaced by underscores.
#[must_use]
pub fn normalize_entity_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

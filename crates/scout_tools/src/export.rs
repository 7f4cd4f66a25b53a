//! Export of the built-in reference tables.

use std::path::{Path, PathBuf};

use ron::ser::PrettyConfig;
use scout_core::data::{ReferenceData, TableKind};
use tracing::info;

use crate::error::{Result, ToolError};
use crate::validate::CATALOG_FILE;

/// How exported files are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportStyle {
    /// The shipped text, comments included.
    #[default]
    Annotated,
    /// Re-serialized from the parsed tables.
    Normalized,
}

/// Write the four built-in reference files into `dir`, creating it if
/// needed. Existing files are overwritten. Returns the paths written.
///
/// # Errors
///
/// Returns an error if the directory or a file cannot be written, or if the
/// built-in tables fail to load for normalized output.
pub fn export_builtin(dir: &Path, style: ExportStyle) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|source| ToolError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut contents: Vec<(&str, String)> = Vec::with_capacity(4);
    match style {
        ExportStyle::Annotated => {
            for kind in TableKind::ALL {
                contents.push((kind.file_name(), ReferenceData::builtin_text(kind).to_string()));
            }
            contents.push((CATALOG_FILE, ReferenceData::builtin_catalog_text().to_string()));
        }
        ExportStyle::Normalized => {
            let reference = ReferenceData::builtin()?;
            let pretty = PrettyConfig::new();
            for kind in TableKind::ALL {
                let text = ron::ser::to_string_pretty(reference.table(kind).data(), pretty.clone())?;
                contents.push((kind.file_name(), text));
            }
            contents.push((
                CATALOG_FILE,
                ron::ser::to_string_pretty(&reference.catalog, pretty)?,
            ));
        }
    }

    let mut written = Vec::with_capacity(contents.len());
    for (file_name, text) in contents {
        let path = dir.join(file_name);
        std::fs::write(&path, text).map_err(|source| ToolError::Io {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }

    info!(files = written.len(), dir = %dir.display(), style = ?style, "Exported reference data");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_reference_dir;

    #[test]
    fn test_exported_files_validate() {
        for style in [ExportStyle::Annotated, ExportStyle::Normalized] {
            let dir = tempfile::tempdir().unwrap();
            let written = export_builtin(dir.path(), style).unwrap();
            assert_eq!(written.len(), 4);

            let report = validate_reference_dir(dir.path()).unwrap();
            assert!(report.is_valid(), "{style:?}: {report:?}");
        }
    }

    #[test]
    fn test_normalized_export_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        export_builtin(dir.path(), ExportStyle::Normalized).unwrap();

        let loaded = ReferenceData::load_from_dir(dir.path()).unwrap();
        let builtin = ReferenceData::builtin().unwrap();
        assert_eq!(loaded.buildings.data(), builtin.buildings.data());
        assert_eq!(loaded.catalog, builtin.catalog);
    }
}

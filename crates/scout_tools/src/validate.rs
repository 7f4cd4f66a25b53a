//! Reference data validation.

use std::path::{Path, PathBuf};

use scout_core::data::{ProductionCatalog, ReferenceData, ReferenceTable, TableKind};
use tracing::{debug, warn};

use crate::error::{Result, ToolError};

/// File name of the production catalog.
pub const CATALOG_FILE: &str = "production.ron";

/// Outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Parsed and validated.
    Valid {
        /// Entities in the file.
        entries: usize,
    },
    /// Not present; the built-in copy will be used.
    Missing,
    /// Present but rejected.
    Invalid(String),
}

/// One checked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCheck {
    /// File name inside the directory.
    pub file_name: &'static str,
    /// Result of the check.
    pub status: FileStatus,
}

/// Result of validating a reference directory.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Directory checked.
    pub dir: PathBuf,
    /// Per-file results.
    pub files: Vec<FileCheck>,
    /// Problem found when combining the files, if every file was valid on
    /// its own.
    pub cross_check: Option<String>,
}

impl ValidationReport {
    /// Number of problems found.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Invalid(_)))
            .count()
            + usize::from(self.cross_check.is_some())
    }

    /// Whether the directory can be used for analysis.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.failures() == 0
    }

    /// Turn a failed report into an error.
    pub fn into_result(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(ToolError::ValidationFailed(self.failures()))
        }
    }
}

fn check_file(
    dir: &Path,
    file_name: &'static str,
    parse: impl Fn(&str) -> std::result::Result<usize, String>,
) -> Result<FileCheck> {
    let path = dir.join(file_name);
    if !path.is_file() {
        debug!("{} not present, built-in copy applies", file_name);
        return Ok(FileCheck {
            file_name,
            status: FileStatus::Missing,
        });
    }
    let text = std::fs::read_to_string(&path).map_err(|source| ToolError::Io {
        path: path.clone(),
        source,
    })?;
    let status = match parse(&text) {
        Ok(entries) => FileStatus::Valid { entries },
        Err(message) => {
            warn!("{}: {}", path.display(), message);
            FileStatus::Invalid(message)
        }
    };
    Ok(FileCheck { file_name, status })
}

/// Validate every reference file in a directory.
///
/// Each table is checked on its own first, so one report lists every broken
/// file. The combined data is checked only when all files pass.
///
/// # Errors
///
/// Returns an error if the directory does not exist or a file cannot be
/// read. Validation problems are reported in the [`ValidationReport`].
pub fn validate_reference_dir(dir: &Path) -> Result<ValidationReport> {
    if !dir.is_dir() {
        return Err(ToolError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut files = Vec::with_capacity(TableKind::ALL.len() + 1);
    for kind in TableKind::ALL {
        files.push(check_file(dir, kind.file_name(), |text| {
            ReferenceTable::from_ron_str(kind.file_name(), text)
                .map(|table| table.len())
                .map_err(|e| e.to_string())
        })?);
    }
    files.push(check_file(dir, CATALOG_FILE, |text| {
        ron::from_str::<ProductionCatalog>(text)
            .map(|catalog| catalog.all_entities().count())
            .map_err(|e| e.to_string())
    })?);

    let all_parsed = files
        .iter()
        .all(|f| !matches!(f.status, FileStatus::Invalid(_)));
    let cross_check = if all_parsed {
        ReferenceData::load_from_dir(dir).err().map(|e| e.to_string())
    } else {
        None
    };

    Ok(ValidationReport {
        dir: dir.to_path_buf(),
        files,
        cross_check,
    })
}

//! Command-line runner for opening analysis.
//!
//! Wraps `scout_core` with the parts that touch the filesystem:
//!
//! - **Reference loading**: tables from a directory, falling back per file
//!   to the built-in copies
//! - **Batch runs**: a directory of replay JSON files analysed in parallel,
//!   one outcome per match
//! - **Reports**: `batch.json`, `features.csv` and a markdown summary
//!
//! # Example
//!
//! ```bash
//! # Analyze one match
//! cargo run -p scout_runner -- analyze --input match.json
//!
//! # Analyze a directory of matches
//! cargo run -p scout_runner -- batch --input replays/ --output results/
//!
//! # Summarize a batch
//! cargo run -p scout_runner -- summarize --input results/batch.json
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod batch;
pub mod reference_loader;
pub mod report;
pub mod summary;

pub use batch::{run_batch, BatchConfig, BatchError, BatchResults, BatchRunError};
pub use reference_loader::{default_reference_dir, load_config, load_reference, ReferenceLoadError};
pub use report::{write_features_csv, OutputFormat, ReportError};
pub use summary::{to_markdown, BatchSummary};

//! # Scout Development Tools
//!
//! Command-line tools for maintaining reference data:
//! - Validating a reference directory before a batch run
//! - Exporting the built-in tables as a starting point for a patch
//! - Looking up a single resolved duration

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod error;
pub mod export;
pub mod lookup;
pub mod validate;

pub use error::{Result, ToolError};

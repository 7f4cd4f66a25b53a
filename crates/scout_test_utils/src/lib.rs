//! # Scout Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Replay builders producing the parser's JSON document
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod strategies;

/// Re-export proptest for convenience.
pub use proptest;

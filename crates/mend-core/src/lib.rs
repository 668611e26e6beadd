//! Core types for the Mend patch engine.
//!
//! This crate provides the foundation types used across all other mend crates.
//! It has ZERO internal crate dependencies and only depends on external libraries.
//!
//! # Architecture
//!
//! mend-core sits at the bottom of the dependency hierarchy:
//! - Layer 1 (Foundation): mend-core ← YOU ARE HERE
//! - Layer 2 (Infrastructure): mend-settings, mend-file-ops
//! - Layer 3 (Domain): mend-blocks, mend-udiff
//! - Layer 4 (Application): mend-engine, mend (CLI)

pub mod edit;
pub mod error;
pub mod utils;

pub use edit::{ApplyResult, EditBatch, EditBlock, ValidationOutcome};
pub use error::PatchError;
pub use utils::{first_line_snippet, truncate_str};

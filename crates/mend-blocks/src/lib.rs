//! SEARCH/REPLACE edit engine: parse, validate, apply.
//!
//! This crate turns raw generator text into an [`mend_core::EditBatch`],
//! checks every block against the current file contents with sequential
//! simulation, and writes fully-validated batches through the file gateway.
//!
//! # Directive grammar
//!
//! ```text
//! <<<<<<< SEARCH
//! exact text to find
//! =======
//! replacement text
//! >>>>>>> REPLACE
//! ```
//!
//! An optional `FILE: path` marker scopes subsequent blocks to a file; a
//! `NEW_FILE: path` marker followed by a fenced region creates a file.
//!
//! # Batch policy
//!
//! All-or-nothing: a batch is written only if every block validates. A
//! single invalid block blocks all writes for the response.

mod applier;
mod parser;
mod validator;

pub use applier::{render_diff, PatchApplier};
pub use parser::BlockParser;
pub use validator::{Validator, WorkingSet};

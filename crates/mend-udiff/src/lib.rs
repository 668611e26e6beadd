//! Unified diff editing: the legacy patch format, applied with a bounded
//! fuzzy offset search.
//!
//! Generators that emit `git diff` style output carry line numbers that
//! drift whenever the file changed since the generator last saw it. This
//! crate parses standard unified diffs and applies each hunk at the header
//! anchor when possible, otherwise at the nearest position within a fixed
//! window where every *removed* line still matches exactly. Context drift
//! is tolerated; removed-line drift never is.
//!
//! A hunk that cannot be placed fails the entire diff: no file is ever
//! left partially patched from a partially-successful diff.

mod applier;
mod parser;

pub use applier::{FuzzyDiffApplier, FUZZY_WINDOW};
pub use parser::{DiffParser, FileDiff, Hunk, HunkLine};

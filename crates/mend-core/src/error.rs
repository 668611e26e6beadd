//! Error taxonomy for the patch engine.
//!
//! Errors fall into two classes that drive the retry loop:
//! - *Recoverable*: the generator produced text that failed to parse or
//!   apply. Feeding the exact error back as correction context gives the
//!   next round a real chance of succeeding.
//! - *Fatal*: retrying cannot help (the file already exists, the path
//!   escapes the workspace, the transport is down). These surface
//!   immediately without consuming a retry round.

use thiserror::Error;

/// All the ways a patch can fail to apply.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatchError {
    /// Malformed directive markers or inconsistent file scoping.
    #[error("malformed edit block: {0}")]
    Parse(String),

    /// The SEARCH text does not occur in the target file.
    #[error("search text not found in {path}.\nFirst line of SEARCH: '{snippet}'\nMake sure the text matches EXACTLY (including whitespace).")]
    NotFound { path: String, snippet: String },

    /// The SEARCH text occurs more than once in the target file.
    #[error("search text matches {count} locations in {path}; include more surrounding context to make the match unique")]
    Ambiguous { path: String, count: usize },

    /// NEW_FILE directive targets a path that already exists.
    #[error("file already exists: {path}. Use a SEARCH/REPLACE block to modify it.")]
    FileExists { path: String },

    /// The requested path resolves outside the workspace root.
    #[error("path '{path}' is outside the workspace root")]
    OutsideRoot { path: String },

    /// The filesystem refused the operation.
    #[error("permission denied: {path}")]
    Permission { path: String },

    /// A unified-diff hunk could not be placed within the fuzzy window.
    #[error("hunk {hunk_index} could not be applied to {path}: {reason}")]
    HunkMismatch {
        path: String,
        hunk_index: usize,
        reason: String,
    },

    /// The generator itself was unreachable or returned a transport-level
    /// failure. Fatal for the whole request.
    #[error("generator transport failure: {0}")]
    Transport(String),
}

impl PatchError {
    /// Whether feeding this error back to the generator as correction
    /// context is worth another round.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PatchError::Parse(_)
                | PatchError::NotFound { .. }
                | PatchError::Ambiguous { .. }
                | PatchError::HunkMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(PatchError::Parse("bad block".into()).is_recoverable());
        assert!(PatchError::NotFound {
            path: "a.py".into(),
            snippet: "def f():".into()
        }
        .is_recoverable());
        assert!(PatchError::Ambiguous {
            path: "a.py".into(),
            count: 2
        }
        .is_recoverable());
        assert!(PatchError::HunkMismatch {
            path: "a.py".into(),
            hunk_index: 0,
            reason: "removed line drifted".into()
        }
        .is_recoverable());
    }

    #[test]
    fn test_fatal_classification() {
        assert!(!PatchError::FileExists { path: "a.py".into() }.is_recoverable());
        assert!(!PatchError::OutsideRoot {
            path: "../etc/passwd".into()
        }
        .is_recoverable());
        assert!(!PatchError::Permission { path: "a.py".into() }.is_recoverable());
        assert!(!PatchError::Transport("connection refused".into()).is_recoverable());
    }

    #[test]
    fn test_ambiguous_message_reports_count() {
        let err = PatchError::Ambiguous {
            path: "main.rs".into(),
            count: 3,
        };
        assert!(err.to_string().contains("3 locations"));
        assert!(err.to_string().contains("more surrounding context"));
    }
}

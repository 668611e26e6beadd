//! Edit directives extracted from generator output.
//!
//! An [`EditBatch`] is everything one generator response asked for. It is
//! created by the block parser, consumed exactly once by the validator and
//! applier, then discarded.

use serde::{Deserialize, Serialize};

use crate::error::PatchError;

/// A single requested edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditBlock {
    /// Replace one exact occurrence of `search` with `replace`.
    ///
    /// `path` is `None` in single-file mode, where the caller supplies the
    /// target; `search` is never empty for a well-formed block.
    Replace {
        path: Option<String>,
        search: String,
        replace: String,
    },
    /// Create a new file with the given content. Never overwrites.
    Create { path: String, content: String },
}

impl EditBlock {
    /// Target path marker, if the block carries one.
    pub fn path(&self) -> Option<&str> {
        match self {
            EditBlock::Replace { path, .. } => path.as_deref(),
            EditBlock::Create { path, .. } => Some(path),
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, EditBlock::Create { .. })
    }
}

/// All directives extracted from one generator response.
///
/// Creation directives are ordered before replace directives: a created
/// file cannot depend on edits from the same response, but an edit may
/// target a file created earlier in the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditBatch {
    pub blocks: Vec<EditBlock>,
    /// Whether the response used explicit `FILE:` scoping markers.
    /// Mixing scoped and unscoped directives is rejected at parse time.
    pub scoped: bool,
}

impl EditBatch {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}

/// Verdict for one block of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub block_index: usize,
    /// `None` means the block validated cleanly.
    pub error: Option<PatchError>,
}

impl ValidationOutcome {
    pub fn valid(block_index: usize) -> Self {
        Self {
            block_index,
            error: None,
        }
    }

    pub fn invalid(block_index: usize, error: PatchError) -> Self {
        Self {
            block_index,
            error: Some(error),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-path result of applying a fully-validated batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub path: String,
    pub blocks_applied: usize,
    pub added_lines: usize,
    pub removed_lines: usize,
    /// Unified-diff preview of the mutation, for display.
    pub diff: String,
}

// PatchError carries no non-serializable payloads, so outcomes can cross
// the CLI JSON boundary directly.
impl Serialize for PatchError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PatchError {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(PatchError::Parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_path_accessor() {
        let replace = EditBlock::Replace {
            path: Some("src/main.rs".into()),
            search: "old".into(),
            replace: "new".into(),
        };
        assert_eq!(replace.path(), Some("src/main.rs"));

        let unscoped = EditBlock::Replace {
            path: None,
            search: "old".into(),
            replace: "new".into(),
        };
        assert_eq!(unscoped.path(), None);

        let create = EditBlock::Create {
            path: "utils.py".into(),
            content: "def helper(): pass\n".into(),
        };
        assert_eq!(create.path(), Some("utils.py"));
        assert!(create.is_create());
    }

    #[test]
    fn test_empty_batch() {
        let batch = EditBatch::default();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
        assert!(!batch.scoped);
    }
}

//! Writes fully-validated batches through the file gateway.

use mend_core::{ApplyResult, PatchError};
use mend_file_ops::FileGateway;

use crate::validator::WorkingSet;

/// Applies the working buffers produced by validation.
///
/// Side effect: exactly one gateway write (or create) per touched path,
/// each atomic. Nothing here re-validates; callers must only hand in a
/// working set whose batch validated completely.
pub struct PatchApplier;

impl PatchApplier {
    /// Persist every touched buffer and report per-path statistics.
    ///
    /// Line deltas come from the search/replace (or created content) line
    /// counts accumulated during validation; the diff preview is rendered
    /// from the original versus final content.
    pub fn apply(working: &WorkingSet, gateway: &FileGateway) -> Result<Vec<ApplyResult>, PatchError> {
        let mut results = Vec::new();

        for path in working.touched_paths() {
            let buffer = working.buffer(path).expect("touched path has a buffer");
            if buffer.blocks_applied == 0 {
                // Loaded for context only; no block changed it.
                continue;
            }

            if buffer.created {
                gateway.create(path, &buffer.content).map_err(PatchError::from)?;
            } else {
                gateway.write(path, &buffer.content).map_err(PatchError::from)?;
            }
            tracing::info!(
                "[applier] {} {}: {} block(s), +{} -{} line(s)",
                if buffer.created { "created" } else { "patched" },
                path,
                buffer.blocks_applied,
                buffer.added_lines,
                buffer.removed_lines
            );

            results.push(ApplyResult {
                path: path.to_string(),
                blocks_applied: buffer.blocks_applied,
                added_lines: buffer.added_lines,
                removed_lines: buffer.removed_lines,
                diff: render_diff(&buffer.original, &buffer.content),
            });
        }

        Ok(results)
    }
}

/// Simple unified line diff between old and new content, for display.
pub fn render_diff(old: &str, new: &str) -> String {
    use similar::{ChangeTag, TextDiff};

    let diff = TextDiff::from_lines(old, new);
    let mut result = String::new();

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        result.push_str(sign);
        result.push_str(change.value());
        if !change.value().ends_with('\n') {
            result.push('\n');
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::BlockParser;
    use crate::validator::Validator;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_apply_writes_and_reports_stats() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("add.py"), "def add(a, b):\n    return a + b\n").unwrap();
        let gw = FileGateway::new(dir.path()).unwrap();

        let response = "<<<<<<< SEARCH\n    return a + b\n=======\n    total = a + b\n    return total\n>>>>>>> REPLACE\n";
        let batch = BlockParser::parse(response).unwrap();
        let (outcomes, working) = Validator::validate(&batch, Some("add.py"), &gw);
        assert!(Validator::all_valid(&outcomes));

        let results = PatchApplier::apply(&working, &gw).unwrap();
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.path, "add.py");
        assert_eq!(result.blocks_applied, 1);
        assert_eq!(result.added_lines, 2);
        assert_eq!(result.removed_lines, 1);
        assert!(result.diff.contains("-    return a + b"));
        assert!(result.diff.contains("+    total = a + b"));

        let on_disk = fs::read_to_string(dir.path().join("add.py")).unwrap();
        assert_eq!(on_disk, "def add(a, b):\n    total = a + b\n    return total\n");
    }

    #[test]
    fn test_apply_creates_new_file() {
        let dir = tempdir().unwrap();
        let gw = FileGateway::new(dir.path()).unwrap();

        let response = "NEW_FILE: utils.py\n```python\ndef helper():\n    return 1\n```\n";
        let batch = BlockParser::parse(response).unwrap();
        let (outcomes, working) = Validator::validate(&batch, None, &gw);
        assert!(Validator::all_valid(&outcomes));

        let results = PatchApplier::apply(&working, &gw).unwrap();
        assert_eq!(results[0].path, "utils.py");
        assert_eq!(results[0].added_lines, 2);
        assert!(dir.path().join("utils.py").exists());
    }

    #[test]
    fn test_multi_file_batch_writes_each_path_once() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "alpha\n").unwrap();
        fs::write(dir.path().join("b.py"), "beta\n").unwrap();
        let gw = FileGateway::new(dir.path()).unwrap();

        let response = "FILE: a.py\n\
            <<<<<<< SEARCH\nalpha\n=======\nALPHA\n>>>>>>> REPLACE\n\
            FILE: b.py\n\
            <<<<<<< SEARCH\nbeta\n=======\nBETA\n>>>>>>> REPLACE\n";
        let batch = BlockParser::parse(response).unwrap();
        let (outcomes, working) = Validator::validate(&batch, None, &gw);
        assert!(Validator::all_valid(&outcomes));

        let results = PatchApplier::apply(&working, &gw).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(fs::read_to_string(dir.path().join("a.py")).unwrap(), "ALPHA\n");
        assert_eq!(fs::read_to_string(dir.path().join("b.py")).unwrap(), "BETA\n");
    }
}

//! Applies parsed hunks with a bounded offset search around each anchor.

use mend_core::PatchError;

use crate::parser::{FileDiff, Hunk, HunkLine};

/// Maximum absolute line distance searched around a hunk's anchor.
pub const FUZZY_WINDOW: usize = 5;

/// Applier for unified diffs.
///
/// Operates purely on content; callers read the file, apply, and write the
/// result back, so a failed diff never touches disk.
pub struct FuzzyDiffApplier;

impl FuzzyDiffApplier {
    /// Apply every hunk of `diff` to `content`, or fail the whole diff.
    ///
    /// Per hunk:
    /// 1. Anchor at the position implied by the `@@` header, shifted by the
    ///    cumulative line delta of earlier hunks.
    /// 2. Exact pre-image match at the anchor wins outright.
    /// 3. Otherwise candidate positions are scanned at increasing distance
    ///    from the anchor (0, −1, +1, −2, +2, …) up to ±[`FUZZY_WINDOW`];
    ///    a candidate matches when every removed line matches exactly.
    ///    Context lines may have drifted and are kept as found in the file.
    pub fn apply(content: &str, diff: &FileDiff) -> Result<String, PatchError> {
        let had_trailing_newline = content.ends_with('\n');
        let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
        let mut delta: i64 = 0;

        for (hunk_index, hunk) in diff.hunks.iter().enumerate() {
            let anchor = (hunk.old_start as i64 - 1 + delta).max(0) as usize;
            let position = Self::locate(&lines, hunk, anchor).ok_or_else(|| {
                PatchError::HunkMismatch {
                    path: diff.path.clone(),
                    hunk_index,
                    reason: format!(
                        "no position within {} line(s) of line {} matches the removed text",
                        FUZZY_WINDOW,
                        anchor + 1
                    ),
                }
            })?;

            if position != anchor {
                tracing::debug!(
                    "[udiff] hunk {} of {} drifted {} line(s) from its anchor",
                    hunk_index + 1,
                    diff.path,
                    position as i64 - anchor as i64
                );
            }

            lines = Self::splice(&lines, position, hunk);
            delta += hunk.added_count() as i64 - hunk.removed_count() as i64;
        }

        let mut result = lines.join("\n");
        if had_trailing_newline && !result.is_empty() {
            result.push('\n');
        }
        Ok(result)
    }

    /// Find the position to apply `hunk`, or `None` if the window is
    /// exhausted.
    fn locate(lines: &[String], hunk: &Hunk, anchor: usize) -> Option<usize> {
        if Self::matches_at(lines, anchor, hunk, true) {
            return Some(anchor);
        }

        // A hunk with no removed lines has nothing to pin a lenient match
        // to; only exact context placement is trustworthy for insertions.
        let strict = hunk.removed_count() == 0;

        for distance in 0..=FUZZY_WINDOW as i64 {
            for offset in [-distance, distance] {
                let candidate = anchor as i64 + offset;
                if candidate < 0 {
                    continue;
                }
                let candidate = candidate as usize;
                if Self::matches_at(lines, candidate, hunk, strict) {
                    return Some(candidate);
                }
                if distance == 0 {
                    break; // -0 and +0 are the same position
                }
            }
        }
        None
    }

    /// Whether the hunk's pre-image fits at `position`. In strict mode
    /// context lines must match too; otherwise only removed lines must.
    fn matches_at(lines: &[String], position: usize, hunk: &Hunk, strict: bool) -> bool {
        if position + hunk.pre_image_len() > lines.len() {
            return false;
        }
        let mut cursor = position;
        for line in &hunk.lines {
            match line {
                HunkLine::Added(_) => {}
                HunkLine::Removed(text) => {
                    if lines[cursor] != *text {
                        return false;
                    }
                    cursor += 1;
                }
                HunkLine::Context(text) => {
                    if strict && lines[cursor] != *text {
                        return false;
                    }
                    cursor += 1;
                }
            }
        }
        true
    }

    /// Rebuild the file with `hunk` applied at `position`. Context lines
    /// are emitted as they appear in the file, preserving tolerated drift.
    fn splice(lines: &[String], position: usize, hunk: &Hunk) -> Vec<String> {
        let mut result: Vec<String> = lines[..position].to_vec();
        let mut cursor = position;
        for line in &hunk.lines {
            match line {
                HunkLine::Context(_) => {
                    result.push(lines[cursor].clone());
                    cursor += 1;
                }
                HunkLine::Removed(_) => cursor += 1,
                HunkLine::Added(text) => result.push(text.clone()),
            }
        }
        result.extend_from_slice(&lines[cursor..]);
        result
    }
}

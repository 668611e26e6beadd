//! Parses unified-diff text into per-file hunks.

use regex::Regex;
use std::sync::OnceLock;

use mend_core::PatchError;

fn hunk_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("valid regex")
    })
}

/// One line of a hunk body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Added(String),
    Removed(String),
}

/// A single `@@` hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 1-indexed line the pre-image starts at, per the header.
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// Number of file lines the pre-image spans (context + removed).
    pub fn pre_image_len(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| !matches!(l, HunkLine::Added(_)))
            .count()
    }

    pub fn removed_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, HunkLine::Removed(_)))
            .count()
    }

    pub fn added_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, HunkLine::Added(_)))
            .count()
    }
}

/// All hunks targeting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub hunks: Vec<Hunk>,
}

/// Parser for `--- a/… / +++ b/… / @@` diff text.
pub struct DiffParser;

impl DiffParser {
    /// Parse every file section out of a diff. Markdown code fences around
    /// the diff are tolerated; anything before the first `---` header is
    /// ignored as prose.
    pub fn parse(text: &str) -> Result<Vec<FileDiff>, PatchError> {
        let mut diffs: Vec<FileDiff> = Vec::new();
        let mut current: Option<FileDiff> = None;
        let mut pending_old_path: Option<String> = None;

        let mut lines = text.lines().peekable();
        while let Some(line) = lines.next() {
            if line.starts_with("```") {
                continue;
            }
            if let Some(rest) = line.strip_prefix("--- ") {
                pending_old_path = Some(strip_diff_prefix(rest, "a/"));
                continue;
            }
            if let Some(rest) = line.strip_prefix("+++ ") {
                if let Some(diff) = current.take() {
                    diffs.push(diff);
                }
                let new_path = strip_diff_prefix(rest, "b/");
                let path = if new_path == "/dev/null" {
                    pending_old_path.take().unwrap_or(new_path)
                } else {
                    new_path
                };
                current = Some(FileDiff { path, hunks: Vec::new() });
                continue;
            }

            let Some(caps) = hunk_header_re().captures(line) else {
                continue;
            };
            let diff = current.as_mut().ok_or_else(|| {
                PatchError::Parse("hunk header before any ---/+++ file header".to_string())
            })?;

            // The regex only admits digits, but a number can still
            // overflow usize; generator input must never panic the parser.
            let field = |m: Option<&str>, default: usize| -> Result<usize, PatchError> {
                let Some(digits) = m else { return Ok(default) };
                digits.parse().map_err(|_| {
                    PatchError::Parse(format!("hunk header has an unusable line number: {}", line))
                })
            };
            let old_start = field(caps.get(1).map(|m| m.as_str()), 0)?;
            let old_count = field(caps.get(2).map(|m| m.as_str()), 1)?;
            let new_start = field(caps.get(3).map(|m| m.as_str()), 0)?;
            let new_count = field(caps.get(4).map(|m| m.as_str()), 1)?;

            let mut hunk = Hunk {
                old_start,
                old_count,
                new_start,
                new_count,
                lines: Vec::new(),
            };

            // The header's counts bound the body; without them a
            // following file's `--- ` header would read as a removed line.
            let mut pre_seen = 0usize;
            let mut post_seen = 0usize;
            while let Some(body) = lines.peek() {
                if pre_seen >= old_count && post_seen >= new_count {
                    break;
                }
                let parsed = if let Some(text) = body.strip_prefix('+') {
                    Some(HunkLine::Added(text.to_string()))
                } else if let Some(text) = body.strip_prefix('-') {
                    Some(HunkLine::Removed(text.to_string()))
                } else if let Some(text) = body.strip_prefix(' ') {
                    Some(HunkLine::Context(text.to_string()))
                } else if body.is_empty() {
                    // Some generators drop the leading space on blank
                    // context lines.
                    Some(HunkLine::Context(String::new()))
                } else {
                    None
                };
                match parsed {
                    Some(hl) => {
                        match &hl {
                            HunkLine::Added(_) => post_seen += 1,
                            HunkLine::Removed(_) => pre_seen += 1,
                            HunkLine::Context(_) => {
                                pre_seen += 1;
                                post_seen += 1;
                            }
                        }
                        hunk.lines.push(hl);
                        lines.next();
                    }
                    None => break,
                }
            }

            if hunk.lines.is_empty() {
                return Err(PatchError::Parse(format!(
                    "hunk at -{},{} has an empty body",
                    old_start, old_count
                )));
            }
            diff.hunks.push(hunk);
        }

        if let Some(diff) = current.take() {
            diffs.push(diff);
        }
        let total: usize = diffs.iter().map(|d| d.hunks.len()).sum();
        tracing::debug!("[udiff] parsed {} file section(s), {} hunk(s)", diffs.len(), total);
        Ok(diffs)
    }
}

fn strip_diff_prefix(path: &str, prefix: &str) -> String {
    let trimmed = path.trim();
    trimmed.strip_prefix(prefix).unwrap_or(trimmed).to_string()
}

//! Extracts edit directives from freeform generator output.

use regex::Regex;
use std::sync::OnceLock;

use mend_core::{EditBatch, EditBlock, PatchError};

const SEARCH_OPEN: &str = "<<<<<<< SEARCH";
const SEPARATOR: &str = "=======";
const REPLACE_CLOSE: &str = ">>>>>>> REPLACE";
const FILE_MARKER: &str = "FILE:";
const NEW_FILE_MARKER: &str = "NEW_FILE:";

fn new_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)NEW_FILE:[ \t]*([^\n]+?)[ \t]*\n```(\w*)\n(.*?)```").expect("valid regex")
    })
}

/// Parser for SEARCH/REPLACE and NEW_FILE directives.
pub struct BlockParser;

impl BlockParser {
    /// Parse all edit directives out of one generator response.
    ///
    /// Text with no directives at all parses to an empty batch; that is a
    /// valid conversational outcome, not an error. Malformed markers and
    /// inconsistent `FILE:` scoping are parse errors for the whole batch.
    pub fn parse(response: &str) -> Result<EditBatch, PatchError> {
        // Creation directives come first: a created file may be edited by
        // later blocks in the same response, never the other way around.
        let (creates, remainder) = Self::extract_new_files(response)?;
        let replaces = Self::extract_replace_blocks(&remainder)?;

        let scoped = remainder
            .lines()
            .any(|l| l.trim_start().starts_with(FILE_MARKER));

        if scoped {
            // Fail closed on partial scoping rather than guessing targets.
            if let Some(idx) = replaces.iter().position(|b| b.path().is_none()) {
                return Err(PatchError::Parse(format!(
                    "inconsistent file scoping: block {} has no FILE: marker but other blocks do; \
                     either scope every SEARCH/REPLACE block or none",
                    idx + 1
                )));
            }
        }

        let mut blocks = creates;
        blocks.extend(replaces);
        tracing::debug!(
            "[parser] extracted {} block(s) (scoped: {})",
            blocks.len(),
            scoped
        );
        Ok(EditBatch { blocks, scoped })
    }

    /// Pull `NEW_FILE:` directives out and return the response text with
    /// their fenced regions blanked, so the block scanner cannot misread
    /// directive markers inside new-file content.
    fn extract_new_files(response: &str) -> Result<(Vec<EditBlock>, String), PatchError> {
        let mut creates = Vec::new();
        for caps in new_file_re().captures_iter(response) {
            let path = caps[1].trim().to_string();
            if path.is_empty() {
                return Err(PatchError::Parse(
                    "NEW_FILE marker with an empty path".to_string(),
                ));
            }
            let content = caps[3].to_string();
            creates.push(EditBlock::Create { path, content });
        }

        let remainder = if creates.is_empty() {
            response.to_string()
        } else {
            new_file_re().replace_all(response, "").into_owned()
        };

        // A NEW_FILE marker that never opened a fence is a malformed
        // directive, not conversation.
        if remainder
            .lines()
            .any(|l| l.trim_start().starts_with(NEW_FILE_MARKER))
        {
            return Err(PatchError::Parse(
                "NEW_FILE marker without a fenced content block".to_string(),
            ));
        }

        Ok((creates, remainder))
    }

    /// Line scanner for SEARCH/REPLACE blocks.
    ///
    /// A `FILE:` marker scopes every block after it until the next marker.
    /// Each block must contain exactly one separator line; zero or several
    /// make the SEARCH/REPLACE boundary ambiguous and fail the batch.
    fn extract_replace_blocks(text: &str) -> Result<Vec<EditBlock>, PatchError> {
        let mut blocks = Vec::new();
        let mut current_path: Option<String> = None;
        let mut lines = text.lines().peekable();
        let mut ordinal = 0usize;

        while let Some(line) = lines.next() {
            let trimmed = line.trim_start();
            if let Some(rest) = trimmed.strip_prefix(FILE_MARKER) {
                let path = rest.trim();
                if path.is_empty() {
                    return Err(PatchError::Parse("FILE marker with an empty path".to_string()));
                }
                current_path = Some(path.to_string());
                continue;
            }

            if trimmed != SEARCH_OPEN {
                continue;
            }
            ordinal += 1;

            let mut body: Vec<&str> = Vec::new();
            let mut closed = false;
            for inner in lines.by_ref() {
                if inner.trim_start() == REPLACE_CLOSE {
                    closed = true;
                    break;
                }
                body.push(inner);
            }
            if !closed {
                return Err(PatchError::Parse(format!(
                    "block {}: unterminated SEARCH/REPLACE block (missing '{}')",
                    ordinal, REPLACE_CLOSE
                )));
            }

            let separators: Vec<usize> = body
                .iter()
                .enumerate()
                .filter(|(_, l)| l.trim_end() == SEPARATOR)
                .map(|(i, _)| i)
                .collect();
            match separators.len() {
                0 => {
                    return Err(PatchError::Parse(format!(
                        "block {}: missing '{}' separator; each block needs exactly one",
                        ordinal, SEPARATOR
                    )))
                }
                1 => {}
                n => {
                    return Err(PatchError::Parse(format!(
                        "block {}: contains {} '{}' markers; the separator must appear exactly \
                         once and is not part of your code",
                        ordinal, n, SEPARATOR
                    )))
                }
            }

            let sep = separators[0];
            let search = body[..sep].join("\n");
            let replace = body[sep + 1..].join("\n");
            if search.is_empty() {
                return Err(PatchError::Parse(format!(
                    "block {}: empty SEARCH section; a replace block must name the text to find",
                    ordinal
                )));
            }

            blocks.push(EditBlock::Replace {
                path: current_path.clone(),
                search,
                replace,
            });
        }

        Ok(blocks)
    }
}

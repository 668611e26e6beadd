//! Prompt templates for correction rounds.
//!
//! Templates are plain strings injected at orchestrator construction;
//! they are configuration, not mutable state. The placeholders
//! `{request}`, `{error}` and `{snapshot}` are substituted per round.

/// Read-only prompt templates used by the orchestrator.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    /// Template for rounds after the first; must contain `{request}`,
    /// `{error}` and `{snapshot}`.
    pub correction: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            correction: DEFAULT_CORRECTION_TEMPLATE.to_string(),
        }
    }
}

const DEFAULT_CORRECTION_TEMPLATE: &str = "\
Your previous edit could not be applied.

Original request:
{request}

Error:
{error}

Current file content (with line numbers for reference; do NOT include the
line numbers in your SEARCH/REPLACE blocks):
{snapshot}

Produce corrected SEARCH/REPLACE blocks. The SEARCH text must match the
file content above EXACTLY, character for character, and must be unique
within the file.";

impl PromptTemplates {
    /// Render the correction prompt for a retry round.
    pub fn correction_prompt(&self, request: &str, error: &str, snapshot: &str) -> String {
        self.correction
            .replace("{request}", request)
            .replace("{error}", error)
            .replace("{snapshot}", snapshot)
    }
}

/// Render one file as a line-numbered snapshot block.
pub(crate) fn numbered_snapshot(path: &str, content: &str) -> String {
    let mut out = format!("FILE: {}\n", path);
    for (i, line) in content.lines().enumerate() {
        out.push_str(&format!("{:>4} | {}\n", i + 1, line));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correction_prompt_substitution() {
        let templates = PromptTemplates::default();
        let prompt = templates.correction_prompt("add a docstring", "search text not found", "FILE: a.py\n   1 | pass\n");
        assert!(prompt.contains("add a docstring"));
        assert!(prompt.contains("search text not found"));
        assert!(prompt.contains("   1 | pass"));
        assert!(!prompt.contains("{request}"));
    }

    #[test]
    fn test_numbered_snapshot() {
        let snap = numbered_snapshot("main.py", "def f():\n    return 1\n");
        assert_eq!(snap, "FILE: main.py\n   1 | def f():\n   2 |     return 1\n");
    }
}

//! Small string utilities shared across the engine.

/// Truncates a string to at most `max_chars` characters, respecting UTF-8
/// character boundaries. Appends an ellipsis when truncation occurred.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

/// First line of a search payload, truncated for error messages.
///
/// Used by NotFound errors so the correction prompt points the generator at
/// the text it got wrong without echoing the entire block back.
pub fn first_line_snippet(s: &str) -> String {
    let first = s.lines().next().unwrap_or("");
    truncate_str(first, 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_short_input_unchanged() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("", 0), "");
    }

    #[test]
    fn test_truncate_str_adds_ellipsis() {
        assert_eq!(truncate_str("hello world", 5), "hello...");
    }

    #[test]
    fn test_truncate_str_multibyte_boundary() {
        // The accented characters are one char but two bytes; counting
        // bytes here would slice mid-character and panic.
        let s = "héllo wörld plus some trailing text";
        let out = truncate_str(s, 8);
        assert_eq!(out, "héllo wö...");
    }

    #[test]
    fn test_first_line_snippet() {
        assert_eq!(first_line_snippet("def add(a, b):\n    return a + b"), "def add(a, b):");
        assert_eq!(first_line_snippet(""), "");

        let long = "x".repeat(80);
        let snippet = first_line_snippet(&long);
        assert_eq!(snippet.chars().count(), 63); // 60 chars + "..."
    }
}

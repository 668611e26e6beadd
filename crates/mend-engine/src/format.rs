//! Patch format sniffing.

/// The two wire formats a generator response may carry.
///
/// The formats are mutually exclusive per response. When a response could
/// plausibly be read as either, SEARCH/REPLACE markers win: they are the
/// current format, and their markers are unambiguous where diff headers
/// can occur in quoted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchFormat {
    SearchReplace,
    UnifiedDiff,
}

impl PatchFormat {
    /// Decide which engine should handle `response`.
    ///
    /// Text with neither format's markers is routed to SEARCH/REPLACE,
    /// which parses it as an empty (conversational) batch.
    pub fn sniff(response: &str) -> PatchFormat {
        if response.contains("<<<<<<< SEARCH") || response.contains("NEW_FILE:") {
            return PatchFormat::SearchReplace;
        }
        let has_headers = response.lines().any(|l| l.starts_with("--- "))
            && response.lines().any(|l| l.starts_with("+++ "))
            && response.lines().any(|l| l.starts_with("@@ -"));
        if has_headers {
            PatchFormat::UnifiedDiff
        } else {
            PatchFormat::SearchReplace
        }
    }
}

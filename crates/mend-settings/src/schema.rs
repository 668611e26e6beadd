//! Settings schema with serde defaults.
//!
//! Every field has a default so a partial (or missing) settings file is
//! always valid.

use serde::{Deserialize, Serialize};

/// Top-level settings loaded from `~/.mend/settings.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MendSettings {
    pub engine: EngineSettings,
    /// Default tracing filter, e.g. "info" or "mend_engine=debug".
    pub log_filter: Option<String>,
}

/// Retry-loop tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Maximum generate→validate rounds per user turn.
    pub max_rounds: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { max_rounds: 3 }
    }
}

//! Loads and persists the settings file.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::schema::MendSettings;

/// Path of the settings file: `~/.mend/settings.toml`.
pub fn settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mend").join("settings.toml"))
}

/// Load settings, falling back to defaults when the file is missing.
///
/// A malformed file is an error rather than a silent fallback; silently
/// ignoring a typo'd `max_rounds` would be worse than failing loudly.
pub fn load_or_default() -> Result<MendSettings> {
    let Some(path) = settings_path() else {
        tracing::debug!("[settings] no home directory; using defaults");
        return Ok(MendSettings::default());
    };
    load_from(&path)
}

pub(crate) fn load_from(path: &std::path::Path) -> Result<MendSettings> {
    if !path.exists() {
        tracing::debug!("[settings] {} not found; using defaults", path.display());
        return Ok(MendSettings::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings from {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid settings file {}", path.display()))
}

/// Persist settings atomically (temp file + rename), creating the parent
/// directory on first run.
pub fn save(settings: &MendSettings) -> Result<()> {
    let path = settings_path().context("cannot determine home directory")?;
    save_to(settings, &path)
}

pub(crate) fn save_to(settings: &MendSettings, path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let rendered = toml::to_string_pretty(settings).context("failed to render settings")?;
    let tmp = path.with_extension("toml.tmp");
    fs::write(&tmp, rendered)
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to move settings into place at {}", path.display()))?;
    tracing::debug!("[settings] saved {}", path.display());
    Ok(())
}

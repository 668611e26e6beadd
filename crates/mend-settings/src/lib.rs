//! Centralized TOML-based settings for Mend.
//!
//! This crate provides configuration management for the CLI, including:
//! - Loading settings from `~/.mend/settings.toml`
//! - Atomic file writes with temp file + rename
//! - Type-safe settings schema with serde defaults
//!
//! CLI flags always override file settings; the file only supplies
//! defaults for values the user did not pass.

pub mod loader;
pub mod schema;

pub use loader::{load_or_default, save, settings_path};
pub use schema::{EngineSettings, MendSettings};

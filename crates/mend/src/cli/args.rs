//! CLI argument parsing using clap.

use std::path::PathBuf;

use clap::Parser;

/// Mend - apply LLM-generated edits to a workspace, safely
#[derive(Parser, Debug, Clone)]
#[command(name = "mend")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Working directory (default: current directory)
    #[arg(long, default_value = ".", env = "MEND_WORKSPACE")]
    pub workspace: PathBuf,

    /// Target file for blocks without a FILE: marker (single-file mode)
    #[arg(short = 'f', long)]
    pub file: Option<String>,

    /// The instruction to send to the generator
    #[arg(short = 'e', long)]
    pub execute: String,

    /// Override the retry round budget from settings
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Replay canned generator responses from a file instead of calling a
    /// live provider ("-" reads stdin). Responses for successive rounds
    /// are separated by a line containing only "===".
    #[arg(long)]
    pub response_file: Option<PathBuf>,

    /// Output the result as JSON (for scripting/parsing)
    #[arg(long)]
    pub json: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Args {
    /// Resolve the workspace path to an absolute path.
    ///
    /// Returns an error if the path does not exist or is not a directory.
    pub fn resolve_workspace(&self) -> anyhow::Result<PathBuf> {
        let path = self
            .workspace
            .canonicalize()
            .map_err(|e| anyhow::anyhow!("workspace {}: {}", self.workspace.display(), e))?;
        if !path.is_dir() {
            anyhow::bail!("workspace {} is not a directory", path.display());
        }
        Ok(path)
    }
}

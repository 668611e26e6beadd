//! The generator seam: whatever produces edit text on request.

use async_trait::async_trait;

use mend_core::PatchError;

/// A black-box producer of edit directives (normally an LLM call).
///
/// The orchestrator only retries within its round budget; transport-level
/// failures are returned as [`PatchError::Transport`] and end the turn.
/// Callers are expected to wrap each call in their own timeout; the
/// orchestrator has no timeout logic of its own.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a response for `prompt`. `context` carries supplementary
    /// material (e.g. file contents) kept separate from the instruction.
    async fn generate(&self, prompt: &str, context: Option<&str>) -> Result<String, PatchError>;
}

//! Retry orchestration: drives generate → parse → validate → apply rounds.
//!
//! The orchestrator owns the only loop in the patch engine. Each round it
//! asks the generator for edits, tries to apply them, and on a recoverable
//! failure builds an increasingly specific correction request (the original
//! intent, the exact error, and a line-numbered snapshot of the affected
//! files) for the next round. The loop is bounded: the generator is never
//! invoked more than `max_rounds` times per user turn.
//!
//! # Architecture
//!
//! This is a **Layer 4 (Application)** crate:
//! - Depends on: mend-core, mend-file-ops, mend-blocks, mend-udiff
//! - Used by: mend (CLI)

mod format;
mod generator;
mod orchestrator;
mod prompts;

#[cfg(test)]
pub(crate) mod test_utils;

pub use format::PatchFormat;
pub use generator::Generator;
pub use orchestrator::{RetryOrchestrator, TurnOutcome, UserRequest};
pub use prompts::PromptTemplates;

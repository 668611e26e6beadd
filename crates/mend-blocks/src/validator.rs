//! Sequential-simulation validation of edit batches.

use std::collections::HashMap;

use mend_core::{first_line_snippet, EditBatch, EditBlock, PatchError, ValidationOutcome};
use mend_file_ops::FileGateway;

/// Per-path working buffers built up while validating a batch.
///
/// The buffers hold the content each file *would* have after every block
/// validated so far, so later blocks can match text introduced by earlier
/// ones. The applier reuses these buffers directly; validation and apply
/// never recompute the same splice twice.
#[derive(Debug, Default)]
pub struct WorkingSet {
    buffers: HashMap<String, FileBuffer>,
    /// Paths in first-touched order, so writes happen in batch order.
    order: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct FileBuffer {
    pub(crate) content: String,
    pub(crate) original: String,
    pub(crate) created: bool,
    pub(crate) blocks_applied: usize,
    pub(crate) added_lines: usize,
    pub(crate) removed_lines: usize,
}

impl WorkingSet {
    /// Current simulated content for a path, if the batch touched it.
    pub fn content(&self, path: &str) -> Option<&str> {
        self.buffers.get(path).map(|b| b.content.as_str())
    }

    /// Paths touched by the batch, in first-touched order.
    pub fn touched_paths(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub(crate) fn buffer(&self, path: &str) -> Option<&FileBuffer> {
        self.buffers.get(path)
    }

    fn entry_or_load(
        &mut self,
        path: &str,
        gateway: &FileGateway,
    ) -> Result<&mut FileBuffer, PatchError> {
        if !self.buffers.contains_key(path) {
            let content = gateway.read(path).map_err(PatchError::from)?;
            self.insert(path, content, false);
        }
        Ok(self.buffers.get_mut(path).expect("buffer just inserted"))
    }

    fn insert(&mut self, path: &str, content: String, created: bool) {
        let added = if created { content.lines().count() } else { 0 };
        self.order.push(path.to_string());
        self.buffers.insert(
            path.to_string(),
            FileBuffer {
                original: if created { String::new() } else { content.clone() },
                content,
                created,
                blocks_applied: if created { 1 } else { 0 },
                added_lines: added,
                removed_lines: 0,
            },
        );
    }
}

/// Validates an [`EditBatch`] against current file contents.
pub struct Validator;

impl Validator {
    /// Produce one [`ValidationOutcome`] per block, simulating each valid
    /// block into the working set before looking at the next one.
    ///
    /// `default_path` is the single-file-mode target used by blocks that
    /// carry no `FILE:` marker.
    ///
    /// Batch policy is all-or-nothing; callers write only when every
    /// outcome is valid (see [`Validator::all_valid`]).
    pub fn validate(
        batch: &EditBatch,
        default_path: Option<&str>,
        gateway: &FileGateway,
    ) -> (Vec<ValidationOutcome>, WorkingSet) {
        let mut working = WorkingSet::default();
        let mut outcomes = Vec::with_capacity(batch.len());

        for (index, block) in batch.blocks.iter().enumerate() {
            let outcome = Self::validate_block(index, block, default_path, gateway, &mut working);
            if let Some(err) = &outcome.error {
                tracing::debug!("[validator] block {} invalid: {}", index + 1, err);
            }
            outcomes.push(outcome);
        }

        (outcomes, working)
    }

    pub fn all_valid(outcomes: &[ValidationOutcome]) -> bool {
        outcomes.iter().all(ValidationOutcome::is_valid)
    }

    fn validate_block(
        index: usize,
        block: &EditBlock,
        default_path: Option<&str>,
        gateway: &FileGateway,
        working: &mut WorkingSet,
    ) -> ValidationOutcome {
        match block {
            EditBlock::Create { path, content } => {
                // Never overwrite: neither a file on disk nor one created
                // earlier in this same batch.
                if gateway.exists(path) || working.buffer(path).is_some() {
                    return ValidationOutcome::invalid(
                        index,
                        PatchError::FileExists { path: path.clone() },
                    );
                }
                working.insert(path, content.clone(), true);
                ValidationOutcome::valid(index)
            }
            EditBlock::Replace { path, search, replace } => {
                let target = match path.as_deref().or(default_path) {
                    Some(t) => t.to_string(),
                    None => {
                        return ValidationOutcome::invalid(
                            index,
                            PatchError::Parse(format!(
                                "block {}: no target file (no FILE: marker and no active file)",
                                index + 1
                            )),
                        )
                    }
                };

                let buffer = match working.entry_or_load(&target, gateway) {
                    Ok(b) => b,
                    Err(err) => return ValidationOutcome::invalid(index, err),
                };

                // Uniqueness is judged against the working buffer, i.e. the
                // content as mutated by every earlier valid block.
                let count = buffer.content.matches(search.as_str()).count();
                match count {
                    0 => ValidationOutcome::invalid(
                        index,
                        PatchError::NotFound {
                            path: target,
                            snippet: first_line_snippet(search),
                        },
                    ),
                    1 => {
                        buffer.content = buffer.content.replacen(search.as_str(), replace, 1);
                        buffer.blocks_applied += 1;
                        buffer.removed_lines += search.lines().count();
                        buffer.added_lines += replace.lines().count();
                        ValidationOutcome::valid(index)
                    }
                    n => ValidationOutcome::invalid(
                        index,
                        PatchError::Ambiguous { path: target, count: n },
                    ),
                }
            }
        }
    }
}

//! The bounded retry state machine.

use std::sync::Arc;

use mend_blocks::{render_diff, BlockParser, PatchApplier, Validator};
use mend_core::{ApplyResult, EditBatch, PatchError};
use mend_file_ops::FileGateway;
use mend_udiff::{DiffParser, FuzzyDiffApplier};

use crate::format::PatchFormat;
use crate::generator::Generator;
use crate::prompts::{numbered_snapshot, PromptTemplates};

/// One user turn: the intent plus an optional single-file target used by
/// unscoped directives.
#[derive(Debug, Clone)]
pub struct UserRequest {
    pub instruction: String,
    pub target_path: Option<String>,
}

/// Terminal state of a turn that did not hit a fatal error.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Every block of some round validated and was written.
    Success {
        results: Vec<ApplyResult>,
        blocks_applied: usize,
        /// Rounds that failed validation before the one that succeeded.
        validation_rounds: u32,
    },
    /// The generator answered in prose with no directives; valid, nothing
    /// to apply.
    NoOpConversational { response: String },
    /// The round budget is exhausted. Carries the last concrete error and
    /// the raw text that failed to apply, so a human can intervene.
    Failure {
        error: PatchError,
        raw_response: String,
        rounds_used: u32,
    },
}

/// What one round produced.
enum RoundResult {
    Applied(Vec<ApplyResult>),
    Conversational,
    /// Worth another round with correction context.
    Recoverable {
        error: PatchError,
        affected: Vec<String>,
    },
    /// Retrying cannot help; ends the turn immediately.
    Fatal(PatchError),
}

/// Drives up to `max_rounds` generate → parse → validate → apply cycles.
pub struct RetryOrchestrator {
    generator: Arc<dyn Generator>,
    gateway: FileGateway,
    max_rounds: u32,
    prompts: PromptTemplates,
}

impl RetryOrchestrator {
    pub fn new(generator: Arc<dyn Generator>, gateway: FileGateway, max_rounds: u32) -> Self {
        Self::with_prompts(generator, gateway, max_rounds, PromptTemplates::default())
    }

    pub fn with_prompts(
        generator: Arc<dyn Generator>,
        gateway: FileGateway,
        max_rounds: u32,
        prompts: PromptTemplates,
    ) -> Self {
        Self {
            generator,
            gateway,
            max_rounds: max_rounds.max(1),
            prompts,
        }
    }

    /// Run one user turn to completion.
    ///
    /// Returns `Err` only for fatal errors (existing-file creation, path
    /// traversal, permissions, transport); recoverable exhaustion is the
    /// `Failure` outcome. Validation and writing happen in one synchronous
    /// step per round; there is no await point between them, so
    /// cancellation at any await never leaves a partial write.
    pub async fn run(&self, request: &UserRequest) -> Result<TurnOutcome, PatchError> {
        let mut last_error: Option<PatchError> = None;
        let mut last_raw = String::new();
        let mut affected: Vec<String> = request.target_path.iter().cloned().collect();

        for round in 1..=self.max_rounds {
            let prompt = match &last_error {
                None => request.instruction.clone(),
                Some(error) => {
                    let snapshot = self.snapshot(&affected);
                    self.prompts
                        .correction_prompt(&request.instruction, &error.to_string(), &snapshot)
                }
            };

            tracing::info!("[engine] round {}/{}", round, self.max_rounds);
            let response = self.generator.generate(&prompt, None).await?;
            last_raw = response.clone();

            match self.try_round(request, &response) {
                RoundResult::Applied(results) => {
                    let blocks_applied = results.iter().map(|r| r.blocks_applied).sum();
                    tracing::info!(
                        "[engine] applied {} block(s) across {} file(s) after {} failed round(s)",
                        blocks_applied,
                        results.len(),
                        round - 1
                    );
                    return Ok(TurnOutcome::Success {
                        results,
                        blocks_applied,
                        validation_rounds: round - 1,
                    });
                }
                RoundResult::Conversational => {
                    tracing::info!("[engine] conversational response; nothing to apply");
                    return Ok(TurnOutcome::NoOpConversational { response });
                }
                RoundResult::Recoverable { error, affected: paths } => {
                    tracing::warn!("[engine] round {} failed: {}", round, error);
                    if !paths.is_empty() {
                        affected = paths;
                    }
                    last_error = Some(error);
                }
                RoundResult::Fatal(error) => {
                    tracing::error!("[engine] fatal: {}", error);
                    return Err(error);
                }
            }
        }

        Ok(TurnOutcome::Failure {
            error: last_error.expect("exhaustion implies at least one error"),
            raw_response: last_raw,
            rounds_used: self.max_rounds,
        })
    }

    /// Parse, validate and (when fully valid) apply one response.
    fn try_round(&self, request: &UserRequest, response: &str) -> RoundResult {
        match PatchFormat::sniff(response) {
            PatchFormat::SearchReplace => self.try_search_replace(request, response),
            PatchFormat::UnifiedDiff => self.try_unified_diff(request, response),
        }
    }

    fn try_search_replace(&self, request: &UserRequest, response: &str) -> RoundResult {
        let batch = match BlockParser::parse(response) {
            Ok(batch) => batch,
            Err(error) => {
                return RoundResult::Recoverable {
                    error,
                    affected: Vec::new(),
                }
            }
        };
        if batch.is_empty() {
            return RoundResult::Conversational;
        }

        let (outcomes, working) =
            Validator::validate(&batch, request.target_path.as_deref(), &self.gateway);
        if Validator::all_valid(&outcomes) {
            return match PatchApplier::apply(&working, &self.gateway) {
                Ok(results) => RoundResult::Applied(results),
                Err(error) if error.is_recoverable() => RoundResult::Recoverable {
                    error,
                    affected: batch_paths(&batch, request),
                },
                Err(error) => RoundResult::Fatal(error),
            };
        }

        let error = outcomes
            .iter()
            .find_map(|o| o.error.clone())
            .expect("invalid batch has at least one error");
        if error.is_recoverable() {
            RoundResult::Recoverable {
                error,
                affected: batch_paths(&batch, request),
            }
        } else {
            RoundResult::Fatal(error)
        }
    }

    fn try_unified_diff(&self, request: &UserRequest, response: &str) -> RoundResult {
        let diffs = match DiffParser::parse(response) {
            Ok(diffs) => diffs,
            Err(error) => {
                return RoundResult::Recoverable {
                    error,
                    affected: Vec::new(),
                }
            }
        };
        if diffs.is_empty() {
            return RoundResult::Conversational;
        }

        // Stage every file's new content before any write: a failed hunk
        // anywhere fails the whole response with zero writes.
        let mut staged: Vec<(String, String, String, usize, usize, usize)> = Vec::new();
        for diff in &diffs {
            let path = if diff.path.is_empty() {
                match &request.target_path {
                    Some(p) => p.clone(),
                    None => {
                        return RoundResult::Recoverable {
                            error: PatchError::Parse("diff names no target file".to_string()),
                            affected: Vec::new(),
                        }
                    }
                }
            } else {
                diff.path.clone()
            };

            let original = match self.gateway.read(&path) {
                Ok(content) => content,
                Err(err) => {
                    let error = PatchError::from(err);
                    return if error.is_recoverable() {
                        RoundResult::Recoverable {
                            error,
                            affected: vec![path],
                        }
                    } else {
                        RoundResult::Fatal(error)
                    };
                }
            };

            match FuzzyDiffApplier::apply(&original, diff) {
                Ok(new_content) => {
                    let added = diff.hunks.iter().map(|h| h.added_count()).sum();
                    let removed = diff.hunks.iter().map(|h| h.removed_count()).sum();
                    staged.push((path, original, new_content, diff.hunks.len(), added, removed));
                }
                Err(error) => {
                    return RoundResult::Recoverable {
                        error,
                        affected: vec![path],
                    }
                }
            }
        }

        let mut results = Vec::with_capacity(staged.len());
        for (path, original, new_content, hunks, added, removed) in staged {
            if let Err(err) = self.gateway.write(&path, &new_content) {
                return RoundResult::Fatal(PatchError::from(err));
            }
            results.push(ApplyResult {
                diff: render_diff(&original, &new_content),
                path,
                blocks_applied: hunks,
                added_lines: added,
                removed_lines: removed,
            });
        }
        RoundResult::Applied(results)
    }

    /// Line-numbered snapshots of the files the failed round touched.
    fn snapshot(&self, affected: &[String]) -> String {
        let mut out = String::new();
        for path in affected {
            match self.gateway.read(path) {
                Ok(content) => out.push_str(&numbered_snapshot(path, &content)),
                // A path the generator invented; nothing to show for it.
                Err(_) => continue,
            }
        }
        if out.is_empty() {
            out.push_str("(no file content available)\n");
        }
        out
    }
}

/// Paths a batch touches, for snapshot purposes.
fn batch_paths(batch: &EditBatch, request: &UserRequest) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    for block in &batch.blocks {
        let path = block
            .path()
            .map(str::to_string)
            .or_else(|| request.target_path.clone());
        if let Some(p) = path {
            if !paths.contains(&p) {
                paths.push(p);
            }
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockGenerator;
    use std::fs;
    use tempfile::tempdir;

    fn request(instruction: &str, target: &str) -> UserRequest {
        UserRequest {
            instruction: instruction.to_string(),
            target_path: Some(target.to_string()),
        }
    }

    #[tokio::test]
    async fn test_success_on_first_round() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("add.py"), "def add(a, b):\n    return a + b\n").unwrap();
        let gateway = FileGateway::new(dir.path()).unwrap();

        let generator = Arc::new(MockGenerator::with_responses(vec![
            "<<<<<<< SEARCH\n    return a + b\n=======\n    return a + b  # sum\n>>>>>>> REPLACE\n"
                .to_string(),
        ]));
        let orchestrator = RetryOrchestrator::new(generator.clone(), gateway, 3);

        let outcome = orchestrator
            .run(&request("comment the return", "add.py"))
            .await
            .unwrap();

        match outcome {
            TurnOutcome::Success {
                blocks_applied,
                validation_rounds,
                ..
            } => {
                assert_eq!(blocks_applied, 1);
                assert_eq!(validation_rounds, 0);
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(generator.calls(), 1);
        assert!(fs::read_to_string(dir.path().join("add.py"))
            .unwrap()
            .contains("# sum"));
    }

    #[tokio::test]
    async fn test_correction_round_recovers() {
        // Round 1 gets the indentation wrong (NotFound); round 2, armed
        // with the error and a numbered snapshot, gets it right.
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("add.py"), "def add(a, b):\n    return a + b\n").unwrap();
        let gateway = FileGateway::new(dir.path()).unwrap();

        let generator = Arc::new(MockGenerator::with_responses(vec![
            "<<<<<<< SEARCH\nreturn a+b\n=======\nreturn a + b  # sum\n>>>>>>> REPLACE\n".to_string(),
            "<<<<<<< SEARCH\n    return a + b\n=======\n    return a + b  # sum\n>>>>>>> REPLACE\n"
                .to_string(),
        ]));
        let orchestrator = RetryOrchestrator::new(generator.clone(), gateway, 3);

        let outcome = orchestrator
            .run(&request("comment the return", "add.py"))
            .await
            .unwrap();

        match outcome {
            TurnOutcome::Success {
                blocks_applied,
                validation_rounds,
                ..
            } => {
                assert_eq!(blocks_applied, 1);
                assert_eq!(validation_rounds, 1);
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(generator.calls(), 2);

        // The correction prompt carried the exact error and a numbered
        // snapshot of the file.
        let second_prompt = generator.prompt(1);
        assert!(second_prompt.contains("search text not found"));
        assert!(second_prompt.contains("'return a+b'"));
        assert!(second_prompt.contains("   1 | def add(a, b):"));
        assert!(second_prompt.contains("   2 |     return a + b"));
    }

    #[tokio::test]
    async fn test_round_budget_is_a_hard_cap() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "content\n").unwrap();
        let gateway = FileGateway::new(dir.path()).unwrap();

        let bad = "<<<<<<< SEARCH\nnope\n=======\nstill nope\n>>>>>>> REPLACE\n".to_string();
        // A fourth response is queued but must never be consumed.
        let generator = Arc::new(MockGenerator::with_responses(vec![
            bad.clone(),
            bad.clone(),
            bad.clone(),
            "<<<<<<< SEARCH\ncontent\n=======\nfixed\n>>>>>>> REPLACE\n".to_string(),
        ]));
        let orchestrator = RetryOrchestrator::new(generator.clone(), gateway, 3);

        let outcome = orchestrator.run(&request("fix it", "a.py")).await.unwrap();
        match outcome {
            TurnOutcome::Failure {
                error,
                raw_response,
                rounds_used,
            } => {
                assert!(matches!(error, PatchError::NotFound { .. }));
                assert_eq!(raw_response, bad);
                assert_eq!(rounds_used, 3);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(generator.calls(), 3);
        assert_eq!(fs::read_to_string(dir.path().join("a.py")).unwrap(), "content\n");
    }

    #[tokio::test]
    async fn test_conversational_response_is_terminal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "content\n").unwrap();
        let gateway = FileGateway::new(dir.path()).unwrap();

        let generator = Arc::new(MockGenerator::with_responses(vec![
            "That code already handles the edge case; no change needed.".to_string(),
        ]));
        let orchestrator = RetryOrchestrator::new(generator.clone(), gateway, 3);

        let outcome = orchestrator
            .run(&request("check the edge case", "a.py"))
            .await
            .unwrap();
        assert!(matches!(outcome, TurnOutcome::NoOpConversational { .. }));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_fatal_error_ends_turn_without_retry() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("utils.py"), "original\n").unwrap();
        let gateway = FileGateway::new(dir.path()).unwrap();

        let generator = Arc::new(MockGenerator::with_responses(vec![
            "NEW_FILE: utils.py\n```python\nclobber\n```\n".to_string(),
            "unused retry response".to_string(),
        ]));
        let orchestrator = RetryOrchestrator::new(generator.clone(), gateway, 3);

        let err = orchestrator
            .run(&request("create utils", "utils.py"))
            .await
            .unwrap_err();
        assert!(matches!(err, PatchError::FileExists { .. }));
        // No retry round was consumed on a fatal error.
        assert_eq!(generator.calls(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("utils.py")).unwrap(),
            "original\n"
        );
    }

    #[tokio::test]
    async fn test_transport_error_is_fatal() {
        let dir = tempdir().unwrap();
        let gateway = FileGateway::new(dir.path()).unwrap();

        let generator = Arc::new(MockGenerator::failing("connection refused"));
        let orchestrator = RetryOrchestrator::new(generator.clone(), gateway, 3);

        let err = orchestrator
            .run(&request("anything", "a.py"))
            .await
            .unwrap_err();
        assert!(matches!(err, PatchError::Transport(_)));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_mixed_scoping_is_retried() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "alpha\n").unwrap();
        let gateway = FileGateway::new(dir.path()).unwrap();

        let generator = Arc::new(MockGenerator::with_responses(vec![
            // Round 1 mixes an unscoped block with a scoped one, which is
            // rejected at parse time.
            "<<<<<<< SEARCH\nbeta\n=======\nBETA\n>>>>>>> REPLACE\n\
             FILE: a.py\n<<<<<<< SEARCH\nalpha\n=======\nALPHA\n>>>>>>> REPLACE\n"
                .to_string(),
            "FILE: a.py\n<<<<<<< SEARCH\nalpha\n=======\nALPHA\n>>>>>>> REPLACE\n".to_string(),
        ]));
        let orchestrator = RetryOrchestrator::new(generator.clone(), gateway, 3);

        let outcome = orchestrator.run(&request("rename", "a.py")).await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn test_unified_diff_round_applies() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("hello.py"),
            "def hello():\n    print(\"Hello World\")\n",
        )
        .unwrap();
        let gateway = FileGateway::new(dir.path()).unwrap();

        let diff = concat!(
            "--- a/hello.py\n",
            "+++ b/hello.py\n",
            "@@ -1,2 +1,3 @@\n",
            " def hello():\n",
            "+    # greet\n",
            "     print(\"Hello World\")\n",
        );
        let generator = Arc::new(MockGenerator::with_responses(vec![diff.to_string()]));
        let orchestrator = RetryOrchestrator::new(generator.clone(), gateway, 3);

        let outcome = orchestrator
            .run(&request("add a comment", "hello.py"))
            .await
            .unwrap();
        match outcome {
            TurnOutcome::Success { results, .. } => {
                assert_eq!(results[0].path, "hello.py");
                assert_eq!(results[0].added_lines, 1);
                assert_eq!(results[0].removed_lines, 0);
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert!(fs::read_to_string(dir.path().join("hello.py"))
            .unwrap()
            .contains("# greet"));
    }

    #[tokio::test]
    async fn test_unified_diff_failure_feeds_retry() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("f.py"), "a\nb\nc\n").unwrap();
        let gateway = FileGateway::new(dir.path()).unwrap();

        let generator = Arc::new(MockGenerator::with_responses(vec![
            // Removed line doesn't exist anywhere near the anchor.
            "--- a/f.py\n+++ b/f.py\n@@ -2,1 +2,1 @@\n-zzz\n+yyy\n".to_string(),
            // Recovery via SEARCH/REPLACE.
            "<<<<<<< SEARCH\nb\n=======\nB\n>>>>>>> REPLACE\n".to_string(),
        ]));
        let orchestrator = RetryOrchestrator::new(generator.clone(), gateway, 3);

        let outcome = orchestrator.run(&request("fix", "f.py")).await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Success { .. }));
        assert_eq!(generator.calls(), 2);
        let second_prompt = generator.prompt(1);
        assert!(second_prompt.contains("hunk 0 could not be applied"));
    }
}

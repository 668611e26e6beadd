//! Deterministic generator fed from a response file.
//!
//! The live-provider seam is the [`Generator`] trait; this implementation
//! replays canned responses so the whole pipeline can run offline, in
//! scripts, and in integration tests. One file may carry responses for
//! several rounds, separated by a line containing only `===`.

use std::sync::Mutex;

use async_trait::async_trait;
use mend_core::PatchError;
use mend_engine::Generator;

pub struct ReplayGenerator {
    responses: Mutex<Vec<String>>,
}

impl ReplayGenerator {
    /// Split `raw` into per-round responses on `===` separator lines.
    pub fn from_raw(raw: &str) -> Self {
        let responses = raw
            .split("\n===\n")
            .map(str::to_string)
            .collect::<Vec<_>>();
        Self {
            responses: Mutex::new(responses),
        }
    }
}

#[async_trait]
impl Generator for ReplayGenerator {
    async fn generate(&self, _prompt: &str, _context: Option<&str>) -> Result<String, PatchError> {
        let mut responses = self.responses.lock().expect("replay lock poisoned");
        if responses.is_empty() {
            // The retry loop wants another round but the script is out of
            // material; surface it as a transport failure.
            return Err(PatchError::Transport(
                "replay file has no response left for this round".to_string(),
            ));
        }
        Ok(responses.remove(0))
    }
}

//! Shared test doubles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use mend_core::PatchError;

use crate::generator::Generator;

/// Generator fed from a fixed queue of canned responses.
///
/// Records every prompt it receives so tests can assert on correction
/// context. Panics if called more times than it has responses; a test
/// that hits that has a round-counting bug.
pub(crate) struct MockGenerator {
    responses: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    failure: Option<String>,
}

impl MockGenerator {
    pub(crate) fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            failure: None,
        }
    }

    /// A generator whose every call fails at the transport level.
    pub(crate) fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            failure: Some(message.to_string()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The prompt of the `index`-th call (0-based).
    pub(crate) fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str, _context: Option<&str>) -> Result<String, PatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(message) = &self.failure {
            return Err(PatchError::Transport(message.clone()));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            panic!("MockGenerator called more times than responses were queued");
        }
        Ok(responses.remove(0))
    }
}

//! Deterministic completion backend for tests.

use std::sync::Mutex;

use crate::{CompletionBackend, CompletionError};

/// A backend that replays queued responses in order.
///
/// Each call to [`CompletionBackend::complete`] pops the next queued entry.
/// An exhausted queue yields an `InvalidResponse` error, so a test that
/// over-calls the backend fails loudly instead of hanging on real I/O.
pub struct ScriptedBackend {
    responses: Mutex<Vec<Result<String, CompletionError>>>,
}

impl ScriptedBackend {
    /// Backend that answers every call with the given responses, in order.
    pub fn new(responses: Vec<Result<String, CompletionError>>) -> Self {
        let mut responses = responses;
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
        }
    }

    /// Backend that always succeeds with one canned response.
    pub fn replying(response: impl Into<String>) -> Self {
        Self::new(vec![Ok(response.into())])
    }

    /// Backend whose single call fails with a network error.
    pub fn failing() -> Self {
        Self::new(vec![Err(CompletionError::Network(
            "scripted failure".to_string(),
        ))])
    }
}

impl CompletionBackend for ScriptedBackend {
    fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        self.responses
            .lock()
            .expect("scripted backend poisoned")
            .pop()
            .unwrap_or_else(|| {
                Err(CompletionError::InvalidResponse(
                    "scripted backend exhausted".to_string(),
                ))
            })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

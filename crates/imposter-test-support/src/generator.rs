//! Test answer generators.

use std::sync::Mutex;

use async_trait::async_trait;
use imposter_core::error::CollaboratorError;
use imposter_core::generator::{AnswerContext, AnswerGenerator};

/// Answers every request with the same text and records each context it was
/// asked with.
#[derive(Debug)]
pub struct RecordingAnswerGenerator {
    reply: String,
    calls: Mutex<Vec<AnswerContext>>,
}

impl RecordingAnswerGenerator {
    /// Create a generator that always replies with `reply`.
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of every context received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<AnswerContext> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerGenerator for RecordingAnswerGenerator {
    async fn generate(&self, context: &AnswerContext) -> Result<String, CollaboratorError> {
        self.calls.lock().unwrap().push(context.clone());
        Ok(self.reply.clone())
    }
}

/// A generator that is always down. Useful for testing the fallback answer.
#[derive(Debug)]
pub struct FailingAnswerGenerator;

#[async_trait]
impl AnswerGenerator for FailingAnswerGenerator {
    async fn generate(&self, _context: &AnswerContext) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable("model endpoint timed out".into()))
    }
}

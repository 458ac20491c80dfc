//! Answer generator clients.

use std::time::Duration;

use async_trait::async_trait;
use imposter_core::error::CollaboratorError;
use imposter_core::generator::{AnswerContext, AnswerGenerator};
use serde::Deserialize;
use tracing::debug;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct GeneratedAnswer {
    answer: String,
}

/// Posts the answer context as JSON to an external service and reads back
/// `{"answer": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpAnswerGenerator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnswerGenerator {
    /// Creates a client for `endpoint` that gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::HttpClient` if the TLS backend cannot be set up.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl AnswerGenerator for HttpAnswerGenerator {
    async fn generate(&self, context: &AnswerContext) -> Result<String, CollaboratorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(context)
            .send()
            .await
            .map_err(|e| CollaboratorError::Unavailable(format!("generator request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Unavailable(format!(
                "generator responded with {status}"
            )));
        }

        let body: GeneratedAnswer = response
            .json()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))?;
        debug!(room_id = %context.room_id, round = context.round_number, "generated answer received");
        Ok(body.answer)
    }
}

/// Used when no generator endpoint is configured: every call fails, so AI
/// seats answer with the fallback text.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAnswerGenerator;

#[async_trait]
impl AnswerGenerator for OfflineAnswerGenerator {
    async fn generate(&self, _context: &AnswerContext) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable(
            "no answer generator configured".to_owned(),
        ))
    }
}

//! Answer generator abstraction.
//!
//! The engine asks an external generator to write the impostors' answers.
//! Failures are absorbed by the engine; they never fail a round.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::error::CollaboratorError;

/// One answer from an already revealed round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorAnswer {
    /// Nickname of the author.
    pub nickname: String,
    /// Whether the author is an AI seat.
    pub from_impostor: bool,
    /// Answer text.
    pub text: String,
}

/// A revealed round, for consistency across the generator's answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorRound {
    /// Round number.
    pub number: u32,
    /// The round's question.
    pub question: String,
    /// Answers in reveal order.
    pub answers: Vec<PriorAnswer>,
}

/// Everything the generator gets to see when writing one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerContext {
    /// Room being played.
    pub room_id: Uuid,
    /// Round being answered.
    pub round_number: u32,
    /// Final round of the game.
    pub max_rounds: u32,
    /// Question to answer.
    pub question: String,
    /// ISO 639-1 language code.
    pub language: String,
    /// Model the room was created with.
    pub model_id: String,
    /// Nickname of the AI seat the answer is written for.
    pub player_nickname: String,
    /// Revealed rounds, oldest first.
    pub prior_rounds: Vec<PriorRound>,
}

/// Writes answers for AI-controlled seats.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Produce free text answering `context.question`.
    async fn generate(&self, context: &AnswerContext) -> Result<String, CollaboratorError>;
}

//! Archival sink abstraction.
//!
//! When a game ends the engine emits one immutable [`GameRecord`] to a
//! write-once sink. Delivery failures are logged by the engine and never
//! retried; the sink owns its own retry policy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::CollaboratorError;
use crate::model::{Language, Player, Round, RoundResult, Vote, Winner};

/// Final, immutable result of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRecord {
    /// Room the game was played in.
    pub room_id: Uuid,
    /// When the game ended.
    pub ended_at: DateTime<Utc>,
    /// Room language.
    pub language: Language,
    /// Model used for the impostors.
    pub ai_model_id: String,
    /// Winning side.
    pub winner: Winner,
    /// Number of rounds played.
    pub total_rounds: u32,
    /// Every seat with its final flags.
    pub players: Vec<Player>,
    /// Every round with its revealed answers.
    pub rounds: Vec<Round>,
    /// Every vote of every round.
    pub votes: Vec<Vote>,
    /// Summary of the deciding tally.
    pub last_round_result: Option<RoundResult>,
}

/// Write-once destination for finished games.
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    /// Persist `record`.
    async fn archive(&self, record: &GameRecord) -> Result<(), CollaboratorError>;
}

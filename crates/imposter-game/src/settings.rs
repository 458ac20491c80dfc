//! Tunable game rules and engine behavior.

use chrono::Duration;

/// How answer generation (and archival) is run after a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiDispatch {
    /// Spawn a tokio task and return to the caller immediately.
    Background,
    /// Await the work before the command returns.
    Inline,
}

/// Bounded retry for optimistic transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `n * backoff` before retrying.
    pub backoff: std::time::Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            backoff: std::time::Duration::from_millis(5),
        }
    }
}

/// Rules of the game plus engine knobs.
#[derive(Debug, Clone)]
pub struct GameSettings {
    /// Length of every answer window.
    pub answer_window: Duration,
    /// Length of every voting window.
    pub vote_window: Duration,
    /// Final round; reaching its tally with an impostor alive means AI wins.
    pub max_rounds: u32,
    /// Seats per room, AI seats included.
    pub max_seats: usize,
    /// Human players required to start.
    pub min_players: usize,
    /// Upper bound on AI seats per room.
    pub max_impostors: usize,
    /// Answers longer than this (in characters) are cut.
    pub max_answer_chars: usize,
    /// Model recorded on rooms created without one.
    pub default_model_id: String,
    /// Transaction retry policy.
    pub retry: RetryPolicy,
    /// Post-commit work mode.
    pub ai_dispatch: AiDispatch,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            answer_window: Duration::seconds(90),
            vote_window: Duration::seconds(60),
            max_rounds: 3,
            max_seats: 5,
            min_players: 2,
            max_impostors: 2,
            max_answer_chars: 500,
            default_model_id: "gpt-5".to_owned(),
            retry: RetryPolicy::default(),
            ai_dispatch: AiDispatch::Background,
        }
    }
}

impl GameSettings {
    /// Human seats available in a room with `impostor_count` AI seats.
    #[must_use]
    pub fn human_capacity(&self, impostor_count: usize) -> usize {
        self.max_seats.saturating_sub(impostor_count)
    }
}

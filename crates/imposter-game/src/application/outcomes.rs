//! Typed results returned by the command handlers.

use imposter_core::model::{RoundPhase, RoundResult};
use serde::Serialize;

/// What a tally request did to the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PhaseAdvance {
    /// The phase had already moved on; nothing was written.
    Unchanged,
    /// This call committed the transition.
    Advanced {
        /// Round the room is in after the transition.
        round: u32,
        /// Phase the room is in after the transition.
        phase: RoundPhase,
        /// The vote tally, when a voting phase was closed.
        result: Option<RoundResult>,
    },
}

/// Acknowledgement of a staged answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerReceipt {
    /// Round the answer counts for.
    pub round: u32,
    /// Whether every active seat has now answered, so the reveal may run
    /// before the deadline.
    pub all_answered: bool,
}

/// Acknowledgement of a recorded vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteReceipt {
    /// Round the vote counts for.
    pub round: u32,
    /// Set only on the receipt of the vote that completed the round.
    pub tally: Option<RoundResult>,
}

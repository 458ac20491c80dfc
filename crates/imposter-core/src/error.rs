//! Game error types.

use thiserror::Error;
use uuid::Uuid;

/// Coarse classification of a [`GameError`], translatable to any transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A room or player does not exist.
    NotFound,
    /// The request itself is malformed (bad config, bad target, blank text).
    InvalidInput,
    /// The operation is not allowed in the room's current status or phase.
    InvalidState,
    /// The caller is not allowed to perform the operation.
    Forbidden,
    /// Duplicate submission or unresolved write contention.
    Conflict,
    /// The store (or another collaborator) failed.
    ExternalDependencyFailure,
}

/// Top-level error type returned by every game command.
#[derive(Debug, Error)]
pub enum GameError {
    /// The room does not exist.
    #[error("room not found: {0}")]
    RoomNotFound(Uuid),

    /// Room settings were rejected at creation.
    #[error("invalid room configuration: {0}")]
    InvalidConfig(String),

    /// A command argument was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every seat in the room is taken.
    #[error("room is full ({capacity} seats)")]
    RoomFull {
        /// Number of seats available to human players.
        capacity: usize,
    },

    /// The room no longer accepts joins, or the player already joined.
    #[error("room is not joinable: {0}")]
    RoomNotJoinable(String),

    /// A host-only command was issued by somebody else.
    #[error("only the host may perform this action")]
    NotHost,

    /// Not enough human players to start.
    #[error("not enough players to start: need {required}, have {actual}")]
    TooFewPlayers {
        /// Minimum number of human players.
        required: usize,
        /// Players currently seated.
        actual: usize,
    },

    /// The room is not in a state that accepts the command.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Answers can only be submitted during the answer window.
    #[error("answers are not being collected right now")]
    NotAnswerPhase,

    /// Votes can only be cast during the voting window.
    #[error("votes are not being collected right now")]
    NotVotingPhase,

    /// A client asked to advance a phase before its deadline and before
    /// every participant acted.
    #[error("the current phase has not ended yet")]
    PhaseNotExpired,

    /// The caller may not act on this room.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The player already has an answer for this round.
    #[error("an answer was already submitted for this round")]
    AlreadyAnswered,

    /// The voter already voted this round.
    #[error("a vote was already cast this round")]
    AlreadyVoted,

    /// The vote target cannot be voted for.
    #[error("invalid vote target: {0}")]
    InvalidTarget(String),

    /// Conditional write lost against a concurrent writer.
    #[error("version conflict on room {room_id}: expected version {expected}, found {actual}")]
    VersionConflict {
        /// The room that had the conflict.
        room_id: Uuid,
        /// The version the writer read.
        expected: i64,
        /// The version found in the store.
        actual: i64,
    },

    /// Optimistic retries were exhausted.
    #[error("room {room_id} is busy: gave up after {attempts} attempts")]
    Conflict {
        /// The contended room.
        room_id: Uuid,
        /// Number of attempts made.
        attempts: u32,
    },

    /// A persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl GameError {
    /// Returns the coarse kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RoomNotFound(_) => ErrorKind::NotFound,
            Self::InvalidConfig(_) | Self::InvalidInput(_) | Self::InvalidTarget(_) => {
                ErrorKind::InvalidInput
            }
            Self::RoomFull { .. }
            | Self::RoomNotJoinable(_)
            | Self::TooFewPlayers { .. }
            | Self::InvalidState(_)
            | Self::NotAnswerPhase
            | Self::NotVotingPhase
            | Self::PhaseNotExpired => ErrorKind::InvalidState,
            Self::NotHost | Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::AlreadyAnswered
            | Self::AlreadyVoted
            | Self::VersionConflict { .. }
            | Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Infrastructure(_) => ErrorKind::ExternalDependencyFailure,
        }
    }

    /// Returns a stable, machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoomNotFound(_) => "room_not_found",
            Self::InvalidConfig(_) => "invalid_config",
            Self::InvalidInput(_) => "invalid_input",
            Self::RoomFull { .. } => "room_full",
            Self::RoomNotJoinable(_) => "room_not_joinable",
            Self::NotHost => "not_host",
            Self::TooFewPlayers { .. } => "too_few_players",
            Self::InvalidState(_) => "invalid_state",
            Self::NotAnswerPhase => "not_answer_phase",
            Self::NotVotingPhase => "not_voting_phase",
            Self::PhaseNotExpired => "phase_not_expired",
            Self::Forbidden(_) => "forbidden",
            Self::AlreadyAnswered => "already_answered",
            Self::AlreadyVoted => "already_voted",
            Self::InvalidTarget(_) => "invalid_target",
            Self::VersionConflict { .. } | Self::Conflict { .. } => "conflict",
            Self::Infrastructure(_) => "infrastructure_error",
        }
    }
}

/// Failure of an external collaborator (answer generator, archival sink).
///
/// These never reach a caller: the engine logs them and falls back.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The collaborator could not be reached or answered with an error.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// The collaborator answered with something unusable.
    #[error("collaborator returned an invalid response: {0}")]
    InvalidResponse(String),
}

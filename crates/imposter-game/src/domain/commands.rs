//! Commands accepted by the game engine.

use imposter_core::command::Command;
use imposter_core::model::{Language, Privacy};
use uuid::Uuid;

/// Command to create a new waiting room.
#[derive(Debug, Clone)]
pub struct CreateRoom {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player creating (and hosting) the room.
    pub host_id: String,
    /// Question and answer language.
    pub language: Language,
    /// Number of AI seats to add at start.
    pub impostor_count: usize,
    /// Lobby visibility.
    pub privacy: Privacy,
    /// Model for the impostors; the configured default when `None`.
    pub ai_model_id: Option<String>,
}

impl Command for CreateRoom {
    fn command_type(&self) -> &'static str {
        "game.create_room"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_id(&self) -> Option<Uuid> {
        None
    }

    fn actor_id(&self) -> &str {
        &self.host_id
    }
}

/// Command to take a seat in a waiting room.
#[derive(Debug, Clone)]
pub struct JoinRoom {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The room to join.
    pub room_id: Uuid,
    /// The joining player.
    pub player_id: String,
}

impl Command for JoinRoom {
    fn command_type(&self) -> &'static str {
        "game.join_room"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_id(&self) -> Option<Uuid> {
        Some(self.room_id)
    }

    fn actor_id(&self) -> &str {
        &self.player_id
    }
}

/// Command to start a waiting room. Host only.
#[derive(Debug, Clone)]
pub struct StartRoom {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The room to start.
    pub room_id: Uuid,
    /// The caller; must be the host.
    pub caller_id: String,
}

impl Command for StartRoom {
    fn command_type(&self) -> &'static str {
        "game.start_room"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_id(&self) -> Option<Uuid> {
        Some(self.room_id)
    }

    fn actor_id(&self) -> &str {
        &self.caller_id
    }
}

/// Command to stage an answer for the current round.
#[derive(Debug, Clone)]
pub struct SubmitAnswer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The room being played.
    pub room_id: Uuid,
    /// The answering player.
    pub player_id: String,
    /// Raw answer text.
    pub text: String,
}

impl Command for SubmitAnswer {
    fn command_type(&self) -> &'static str {
        "game.submit_answer"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_id(&self) -> Option<Uuid> {
        Some(self.room_id)
    }

    fn actor_id(&self) -> &str {
        &self.player_id
    }
}

/// Command to close the answer phase and reveal.
#[derive(Debug, Clone)]
pub struct TallyAnswers {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The room being played.
    pub room_id: Uuid,
    /// The caller; must be seated in the room.
    pub caller_id: String,
}

impl Command for TallyAnswers {
    fn command_type(&self) -> &'static str {
        "game.tally_answers"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_id(&self) -> Option<Uuid> {
        Some(self.room_id)
    }

    fn actor_id(&self) -> &str {
        &self.caller_id
    }
}

/// Command to cast a vote in the current voting phase.
#[derive(Debug, Clone)]
pub struct SubmitVote {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The room being played.
    pub room_id: Uuid,
    /// The voting player.
    pub voter_id: String,
    /// The accused player.
    pub target_id: String,
}

impl Command for SubmitVote {
    fn command_type(&self) -> &'static str {
        "game.submit_vote"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_id(&self) -> Option<Uuid> {
        Some(self.room_id)
    }

    fn actor_id(&self) -> &str {
        &self.voter_id
    }
}

/// Command to close the voting phase and tally.
#[derive(Debug, Clone)]
pub struct TallyVotes {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The room being played.
    pub room_id: Uuid,
    /// The caller; must be seated in the room.
    pub caller_id: String,
}

impl Command for TallyVotes {
    fn command_type(&self) -> &'static str {
        "game.tally_votes"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_id(&self) -> Option<Uuid> {
        Some(self.room_id)
    }

    fn actor_id(&self) -> &str {
        &self.caller_id
    }
}

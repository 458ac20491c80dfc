//! The room document and everything embedded in it.
//!
//! A [`Room`] is the complete authoritative state of one game. It is owned
//! and mutated exclusively by the engine; stores only persist it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Accepting players; nobody has a display name yet.
    Waiting,
    /// Rounds are being played.
    InProgress,
    /// A winner was decided.
    Finished,
}

/// Sub-state within an active game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundPhase {
    /// No round is running (room still waiting).
    #[serde(rename = "none")]
    None,
    /// Players are writing answers to the round's question.
    AnswerSubmission,
    /// Players are voting on who the impostor is.
    Voting,
    /// The game is over.
    GameEnded,
}

/// Language the room's questions and AI answers are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    En,
    /// Korean.
    Ko,
}

impl Language {
    /// ISO 639-1 code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ko => "ko",
        }
    }
}

/// Whether the room appears in the public lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    /// Listed in the lobby.
    Public,
    /// Joinable by id only.
    Private,
}

/// Role of an eliminated player, as reported in the round summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A human participant.
    Human,
    /// An AI impostor.
    Ai,
}

/// Side that won a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    /// Every impostor was voted out.
    Humans,
    /// An impostor survived the final round.
    Ai,
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndCondition {
    /// No active impostor remains.
    AllImpostorsEliminated,
    /// The final round was tallied with an impostor still active.
    MaxRoundsReached,
}

/// A seat in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Stable external identity. Never shown to other players.
    pub uid: String,
    /// Public id of the seat, drawn for every seat when the game starts.
    #[serde(default)]
    pub seat_id: Option<Uuid>,
    /// In-game nickname; `None` until the game starts.
    pub display_name: Option<String>,
    /// Whether this seat is AI-controlled.
    pub is_impostor: bool,
    /// Whether this seat was voted out.
    pub is_eliminated: bool,
    /// Round in which the seat was voted out.
    #[serde(default)]
    pub eliminated_in_round: Option<u32>,
}

impl Player {
    /// A human seat without a display name.
    #[must_use]
    pub fn human(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            seat_id: None,
            display_name: None,
            is_impostor: false,
            is_eliminated: false,
            eliminated_in_round: None,
        }
    }

    /// An AI seat with a fresh opaque uid.
    #[must_use]
    pub fn ai() -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            seat_id: None,
            display_name: None,
            is_impostor: true,
            is_eliminated: false,
            eliminated_in_round: None,
        }
    }

    /// Not eliminated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_eliminated
    }

    /// Display name, or a neutral label before names are assigned.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Unknown")
    }
}

/// An answer made public by the reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedAnswer {
    /// Author uid.
    pub player_id: String,
    /// Author nickname at reveal time.
    pub display_name: Option<String>,
    /// Answer text.
    pub text: String,
    /// When the answer was staged.
    pub submitted_at: DateTime<Utc>,
}

/// One round of the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// 1-based round number.
    pub number: u32,
    /// The question everyone answers.
    pub question: String,
    /// Uids with a staged answer, in submission order. Carries no text.
    #[serde(default)]
    pub answered_by: Vec<String>,
    /// Accepted staged submission per author.
    #[serde(default)]
    pub submissions: BTreeMap<String, Uuid>,
    /// Answers moved here by the reveal.
    #[serde(default)]
    pub revealed_answers: Vec<RevealedAnswer>,
}

impl Round {
    /// A fresh round with no answers.
    #[must_use]
    pub fn new(number: u32, question: impl Into<String>) -> Self {
        Self {
            number,
            question: question.into(),
            answered_by: Vec::new(),
            submissions: BTreeMap::new(),
            revealed_answers: Vec::new(),
        }
    }

    /// Whether `uid` has staged an answer this round.
    #[must_use]
    pub fn has_answered(&self, uid: &str) -> bool {
        self.answered_by.iter().any(|a| a == uid)
    }
}

/// A vote cast during a voting phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Who voted.
    pub voter_id: String,
    /// Who they voted for.
    pub target_id: String,
    /// Round the vote belongs to.
    pub round: u32,
}

/// Summary of the most recent tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Round that was tallied.
    pub round: u32,
    /// Number of votes counted.
    pub total_votes: usize,
    /// Votes received per target uid.
    pub vote_counts: BTreeMap<String, u32>,
    /// Uid of the eliminated player, if any.
    pub eliminated_player_id: Option<String>,
    /// Nickname of the eliminated player, if any.
    pub eliminated_player_name: Option<String>,
    /// Role of the eliminated player, if any.
    pub eliminated_role: Option<Role>,
    /// Human-readable one-line summary.
    pub summary: String,
    /// Whether this tally ended the game.
    pub game_ended: bool,
    /// Why the game ended, when it did.
    pub end_condition: Option<EndCondition>,
}

/// The complete authoritative state of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Room identifier.
    pub id: Uuid,
    /// Uid of the player who created the room.
    pub host_id: String,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Current phase; only meaningful while in progress.
    pub round_phase: RoundPhase,
    /// Question and answer language.
    pub language: Language,
    /// Lobby visibility.
    pub privacy: Privacy,
    /// Number of AI seats added at start.
    pub impostor_count: usize,
    /// Model identifier forwarded to the answer generator.
    pub ai_model_id: String,
    /// Current round number; `0` before the game starts.
    pub current_round: u32,
    /// When the current phase opened.
    pub round_start_time: Option<DateTime<Utc>>,
    /// Deadline of the current phase.
    pub round_end_time: Option<DateTime<Utc>>,
    /// Seats in display order.
    pub players: Vec<Player>,
    /// One entry per started round.
    pub rounds: Vec<Round>,
    /// Votes of the current round.
    pub votes: Vec<Vote>,
    /// Votes of earlier rounds.
    #[serde(default)]
    pub vote_history: Vec<Vote>,
    /// Summary of the most recent tally.
    pub last_round_result: Option<RoundResult>,
    /// Winner, once finished.
    pub winner: Option<Winner>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// A waiting room containing only its host.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        host_id: impl Into<String>,
        language: Language,
        privacy: Privacy,
        impostor_count: usize,
        ai_model_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let host_id = host_id.into();
        Self {
            id,
            players: vec![Player::human(host_id.clone())],
            host_id,
            status: RoomStatus::Waiting,
            round_phase: RoundPhase::None,
            language,
            privacy,
            impostor_count,
            ai_model_id: ai_model_id.into(),
            current_round: 0,
            round_start_time: None,
            round_end_time: None,
            rounds: Vec::new(),
            votes: Vec::new(),
            vote_history: Vec::new(),
            last_round_result: None,
            winner: None,
            created_at,
        }
    }

    /// Looks up a seat by uid.
    #[must_use]
    pub fn player(&self, uid: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.uid == uid)
    }

    /// Looks up a seat by uid, mutably.
    pub fn player_mut(&mut self, uid: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.uid == uid)
    }

    /// The entry of the round currently being played.
    #[must_use]
    pub fn current_round_entry(&self) -> Option<&Round> {
        self.rounds.iter().find(|r| r.number == self.current_round)
    }

    /// The entry of the round currently being played, mutably.
    pub fn current_round_entry_mut(&mut self) -> Option<&mut Round> {
        let current = self.current_round;
        self.rounds.iter_mut().find(|r| r.number == current)
    }

    /// Seats that are still in the game.
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_active())
    }

    /// Human seats that are still in the game.
    pub fn active_humans(&self) -> impl Iterator<Item = &Player> {
        self.active_players().filter(|p| !p.is_impostor)
    }

    /// Every AI seat, eliminated or not.
    pub fn ai_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_impostor)
    }

    /// Whether the room appears in the public lobby.
    #[must_use]
    pub fn is_listed(&self) -> bool {
        self.privacy == Privacy::Public && self.status == RoomStatus::Waiting
    }
}

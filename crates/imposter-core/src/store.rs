//! Room store abstraction.
//!
//! The store persists the room document with a version number and keeps the
//! answer staging log. It offers a conditional write; the retrying
//! transaction is built on top of it by the engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::GameError;
use crate::model::Room;

/// A room document together with the version it was read at.
#[derive(Debug, Clone)]
pub struct VersionedRoom {
    /// The document.
    pub room: Room,
    /// Monotonically increasing write counter, starting at `1`.
    pub version: i64,
}

/// An answer waiting for the reveal. Never readable by players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAnswer {
    /// Identifies this submission; the room records which one was accepted.
    pub submission_id: Uuid,
    /// Room the answer belongs to.
    pub room_id: Uuid,
    /// Author uid.
    pub author_id: String,
    /// Round the answer belongs to.
    pub round_number: u32,
    /// Answer text.
    pub text: String,
    /// When the answer was submitted.
    pub submitted_at: DateTime<Utc>,
}

/// Store trait for the room document and its answer staging log.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Load a room and its current version. `Ok(None)` if it does not exist.
    async fn load_room(&self, room_id: Uuid) -> Result<Option<VersionedRoom>, GameError>;

    /// Insert a brand-new room at version `1`.
    async fn insert_room(&self, room: &Room) -> Result<(), GameError>;

    /// Replace the room if the stored version still equals
    /// `expected_version`. Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns `GameError::VersionConflict` when another writer got there
    /// first.
    async fn save_room(&self, room: &Room, expected_version: i64) -> Result<i64, GameError>;

    /// Public rooms that are still waiting, oldest first.
    async fn list_open_rooms(&self, limit: usize) -> Result<Vec<Room>, GameError>;

    /// Stage an answer. Every submission gets its own row, so a rejected
    /// resubmission never touches the text that was accepted.
    async fn stage_answer(&self, answer: StagedAnswer) -> Result<(), GameError>;

    /// Delete one staged submission. Returns whether a row was removed.
    async fn discard_staged_answer(
        &self,
        room_id: Uuid,
        submission_id: Uuid,
    ) -> Result<bool, GameError>;

    /// All staged answers of a room.
    async fn staged_answers(&self, room_id: Uuid) -> Result<Vec<StagedAnswer>, GameError>;

    /// Delete staged answers of every round up to and including
    /// `through_round`. Returns the number of rows removed.
    async fn discard_staged(&self, room_id: Uuid, through_round: u32) -> Result<u64, GameError>;
}

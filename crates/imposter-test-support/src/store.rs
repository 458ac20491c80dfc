//! Test room stores: in-memory `RoomStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use imposter_core::error::GameError;
use imposter_core::model::Room;
use imposter_core::store::{RoomStore, StagedAnswer, VersionedRoom};
use uuid::Uuid;

/// A fully working store kept in memory. Conditional writes compare the
/// stored version under a mutex, so concurrent tasks observe the same
/// conflicts a database would report.
#[derive(Debug, Default)]
pub struct InMemoryRoomStore {
    rooms: Mutex<HashMap<Uuid, (i64, Room)>>,
    staged: Mutex<Vec<StagedAnswer>>,
    saves: AtomicUsize,
}

impl InMemoryRoomStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already contains `room` at version `1`.
    #[must_use]
    pub fn with_room(room: Room) -> Self {
        let store = Self::new();
        store.rooms.lock().unwrap().insert(room.id, (1, room));
        store
    }

    /// Returns the stored room, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn room(&self, room_id: Uuid) -> Option<Room> {
        self.rooms
            .lock()
            .unwrap()
            .get(&room_id)
            .map(|(_, room)| room.clone())
    }

    /// Returns the stored version of a room, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn version(&self, room_id: Uuid) -> Option<i64> {
        self.rooms
            .lock()
            .unwrap()
            .get(&room_id)
            .map(|(version, _)| *version)
    }

    /// Returns a snapshot of the staging log.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn staged(&self) -> Vec<StagedAnswer> {
        self.staged.lock().unwrap().clone()
    }

    /// Number of successful conditional writes.
    pub fn successful_saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn load_room(&self, room_id: Uuid) -> Result<Option<VersionedRoom>, GameError> {
        Ok(self
            .rooms
            .lock()
            .unwrap()
            .get(&room_id)
            .map(|(version, room)| VersionedRoom {
                room: room.clone(),
                version: *version,
            }))
    }

    async fn insert_room(&self, room: &Room) -> Result<(), GameError> {
        let mut rooms = self.rooms.lock().unwrap();
        if rooms.contains_key(&room.id) {
            return Err(GameError::Infrastructure(format!(
                "room {} already exists",
                room.id
            )));
        }
        rooms.insert(room.id, (1, room.clone()));
        Ok(())
    }

    async fn save_room(&self, room: &Room, expected_version: i64) -> Result<i64, GameError> {
        let mut rooms = self.rooms.lock().unwrap();
        let Some((version, stored)) = rooms.get_mut(&room.id) else {
            return Err(GameError::RoomNotFound(room.id));
        };
        if *version != expected_version {
            return Err(GameError::VersionConflict {
                room_id: room.id,
                expected: expected_version,
                actual: *version,
            });
        }
        *version += 1;
        *stored = room.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(*version)
    }

    async fn list_open_rooms(&self, limit: usize) -> Result<Vec<Room>, GameError> {
        let mut open: Vec<Room> = self
            .rooms
            .lock()
            .unwrap()
            .values()
            .filter(|(_, room)| room.is_listed())
            .map(|(_, room)| room.clone())
            .collect();
        open.sort_by_key(|room| room.created_at);
        open.truncate(limit);
        Ok(open)
    }

    async fn stage_answer(&self, answer: StagedAnswer) -> Result<(), GameError> {
        self.staged.lock().unwrap().push(answer);
        Ok(())
    }

    async fn discard_staged_answer(
        &self,
        room_id: Uuid,
        submission_id: Uuid,
    ) -> Result<bool, GameError> {
        let mut staged = self.staged.lock().unwrap();
        let before = staged.len();
        staged.retain(|s| !(s.room_id == room_id && s.submission_id == submission_id));
        Ok(staged.len() < before)
    }

    async fn staged_answers(&self, room_id: Uuid) -> Result<Vec<StagedAnswer>, GameError> {
        Ok(self
            .staged
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn discard_staged(&self, room_id: Uuid, through_round: u32) -> Result<u64, GameError> {
        let mut staged = self.staged.lock().unwrap();
        let before = staged.len();
        staged.retain(|s| !(s.room_id == room_id && s.round_number <= through_round));
        Ok((before - staged.len()) as u64)
    }
}

/// Wraps an [`InMemoryRoomStore`] and rejects the first `conflicts`
/// conditional writes with a version conflict, as if another writer had won.
#[derive(Debug)]
pub struct ConflictingRoomStore {
    inner: InMemoryRoomStore,
    remaining: AtomicU32,
}

impl ConflictingRoomStore {
    /// Create a store around `inner` that loses the next `conflicts` writes.
    #[must_use]
    pub fn new(inner: InMemoryRoomStore, conflicts: u32) -> Self {
        Self {
            inner,
            remaining: AtomicU32::new(conflicts),
        }
    }

    /// The wrapped store.
    #[must_use]
    pub fn inner(&self) -> &InMemoryRoomStore {
        &self.inner
    }
}

#[async_trait]
impl RoomStore for ConflictingRoomStore {
    async fn load_room(&self, room_id: Uuid) -> Result<Option<VersionedRoom>, GameError> {
        self.inner.load_room(room_id).await
    }

    async fn insert_room(&self, room: &Room) -> Result<(), GameError> {
        self.inner.insert_room(room).await
    }

    async fn save_room(&self, room: &Room, expected_version: i64) -> Result<i64, GameError> {
        let lose = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lose {
            return Err(GameError::VersionConflict {
                room_id: room.id,
                expected: expected_version,
                actual: expected_version + 1,
            });
        }
        self.inner.save_room(room, expected_version).await
    }

    async fn list_open_rooms(&self, limit: usize) -> Result<Vec<Room>, GameError> {
        self.inner.list_open_rooms(limit).await
    }

    async fn stage_answer(&self, answer: StagedAnswer) -> Result<(), GameError> {
        self.inner.stage_answer(answer).await
    }

    async fn discard_staged_answer(
        &self,
        room_id: Uuid,
        submission_id: Uuid,
    ) -> Result<bool, GameError> {
        self.inner.discard_staged_answer(room_id, submission_id).await
    }

    async fn staged_answers(&self, room_id: Uuid) -> Result<Vec<StagedAnswer>, GameError> {
        self.inner.staged_answers(room_id).await
    }

    async fn discard_staged(&self, room_id: Uuid, through_round: u32) -> Result<u64, GameError> {
        self.inner.discard_staged(room_id, through_round).await
    }
}

/// A store that always returns an infrastructure error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingRoomStore;

#[async_trait]
impl RoomStore for FailingRoomStore {
    async fn load_room(&self, _room_id: Uuid) -> Result<Option<VersionedRoom>, GameError> {
        Err(GameError::Infrastructure("connection refused".into()))
    }

    async fn insert_room(&self, _room: &Room) -> Result<(), GameError> {
        Err(GameError::Infrastructure("connection refused".into()))
    }

    async fn save_room(&self, _room: &Room, _expected_version: i64) -> Result<i64, GameError> {
        Err(GameError::Infrastructure("connection refused".into()))
    }

    async fn list_open_rooms(&self, _limit: usize) -> Result<Vec<Room>, GameError> {
        Err(GameError::Infrastructure("connection refused".into()))
    }

    async fn stage_answer(&self, _answer: StagedAnswer) -> Result<(), GameError> {
        Err(GameError::Infrastructure("connection refused".into()))
    }

    async fn discard_staged_answer(
        &self,
        _room_id: Uuid,
        _submission_id: Uuid,
    ) -> Result<bool, GameError> {
        Err(GameError::Infrastructure("connection refused".into()))
    }

    async fn staged_answers(&self, _room_id: Uuid) -> Result<Vec<StagedAnswer>, GameError> {
        Err(GameError::Infrastructure("connection refused".into()))
    }

    async fn discard_staged(&self, _room_id: Uuid, _through_round: u32) -> Result<u64, GameError> {
        Err(GameError::Infrastructure("connection refused".into()))
    }
}

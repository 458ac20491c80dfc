//! Query handlers: read-only views of rooms.

use chrono::{DateTime, Utc};
use imposter_core::error::GameError;
use imposter_core::model::{Language, Room};
use imposter_core::store::RoomStore;
use serde::Serialize;
use uuid::Uuid;

use crate::settings::GameSettings;

/// A public room that is still accepting players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenRoomView {
    /// The room identifier.
    pub room_id: Uuid,
    /// Host of the room.
    pub host_id: String,
    /// Question language.
    pub language: Language,
    /// Human players seated so far.
    pub player_count: usize,
    /// Human seats available in total.
    pub max_players: usize,
    /// Model the impostors will use.
    pub ai_model_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Retrieves the full room document.
///
/// # Errors
///
/// Returns `GameError::RoomNotFound` if the room does not exist, or a store
/// error.
pub async fn get_room(room_id: Uuid, store: &dyn RoomStore) -> Result<Room, GameError> {
    store
        .load_room(room_id)
        .await?
        .map(|versioned| versioned.room)
        .ok_or(GameError::RoomNotFound(room_id))
}

/// Lists up to `limit` public waiting rooms, oldest first.
///
/// # Errors
///
/// Returns a store error.
pub async fn list_open_rooms(
    limit: usize,
    store: &dyn RoomStore,
    settings: &GameSettings,
) -> Result<Vec<OpenRoomView>, GameError> {
    let rooms = store.list_open_rooms(limit).await?;
    Ok(rooms
        .into_iter()
        .map(|room| OpenRoomView {
            room_id: room.id,
            player_count: room.players.len(),
            max_players: settings.human_capacity(room.impostor_count),
            host_id: room.host_id,
            language: room.language,
            ai_model_id: room.ai_model_id,
            created_at: room.created_at,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use imposter_core::error::GameError;
    use imposter_core::model::{Language, Privacy, Room, RoomStatus};
    use imposter_core::store::RoomStore;
    use imposter_test_support::{FailingRoomStore, InMemoryRoomStore};
    use uuid::Uuid;

    use crate::application::query_handlers::{get_room, list_open_rooms};
    use crate::settings::GameSettings;

    fn room(privacy: Privacy, impostors: usize, minutes: i64) -> Room {
        let base = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        Room::new(
            Uuid::new_v4(),
            "host",
            Language::En,
            privacy,
            impostors,
            "gpt-5",
            base + Duration::minutes(minutes),
        )
    }

    #[tokio::test]
    async fn test_get_room_returns_stored_document() {
        // Arrange
        let stored = room(Privacy::Public, 1, 0);
        let store = InMemoryRoomStore::with_room(stored.clone());

        // Act
        let loaded = get_room(stored.id, &store).await.unwrap();

        // Assert
        assert_eq!(loaded, stored);
    }

    #[tokio::test]
    async fn test_get_room_returns_not_found_for_unknown_id() {
        let store = InMemoryRoomStore::new();
        let room_id = Uuid::new_v4();

        let result = get_room(room_id, &store).await;

        match result.unwrap_err() {
            GameError::RoomNotFound(id) => assert_eq!(id, room_id),
            other => panic!("expected RoomNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_open_rooms_shows_public_waiting_rooms_oldest_first() {
        // Arrange
        let store = InMemoryRoomStore::new();
        let newer = room(Privacy::Public, 2, 5);
        let older = room(Privacy::Public, 1, 1);
        let private = room(Privacy::Private, 1, 0);
        let mut started = room(Privacy::Public, 1, 0);
        started.status = RoomStatus::InProgress;
        for r in [&newer, &older, &private, &started] {
            store.insert_room(r).await.unwrap();
        }

        // Act
        let views = list_open_rooms(10, &store, &GameSettings::default())
            .await
            .unwrap();

        // Assert
        let ids: Vec<Uuid> = views.iter().map(|v| v.room_id).collect();
        assert_eq!(ids, vec![older.id, newer.id]);
        assert_eq!(views[0].max_players, 4);
        assert_eq!(views[1].max_players, 3);
        assert_eq!(views[0].player_count, 1);
    }

    #[tokio::test]
    async fn test_list_open_rooms_propagates_store_failure() {
        let result = list_open_rooms(10, &FailingRoomStore, &GameSettings::default()).await;

        assert!(matches!(result, Err(GameError::Infrastructure(_))));
    }
}

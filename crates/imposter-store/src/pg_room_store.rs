//! `PostgreSQL` implementation of the `RoomStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use imposter_core::error::GameError;
use imposter_core::model::Room;
use imposter_core::store::{RoomStore, StagedAnswer, VersionedRoom};

fn db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> GameError {
    move |e| GameError::Infrastructure(format!("{operation} failed: {e}"))
}

/// PostgreSQL-backed room store.
#[derive(Debug, Clone)]
pub struct PgRoomStore {
    pool: PgPool,
}

impl PgRoomStore {
    /// Creates a new `PgRoomStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomStore for PgRoomStore {
    async fn load_room(&self, room_id: Uuid) -> Result<Option<VersionedRoom>, GameError> {
        let row = sqlx::query("SELECT version, document FROM rooms WHERE id = $1")
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("load room"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let version: i64 = row.try_get("version").map_err(db_error("read version"))?;
        let Json(room): Json<Room> = row
            .try_get("document")
            .map_err(db_error("decode room document"))?;
        Ok(Some(VersionedRoom { room, version }))
    }

    async fn insert_room(&self, room: &Room) -> Result<(), GameError> {
        sqlx::query(
            "INSERT INTO rooms (id, version, listed, document, created_at) \
             VALUES ($1, 1, $2, $3, $4)",
        )
        .bind(room.id)
        .bind(room.is_listed())
        .bind(Json(room))
        .bind(room.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("insert room"))?;

        debug!(room_id = %room.id, "room inserted");
        Ok(())
    }

    async fn save_room(&self, room: &Room, expected_version: i64) -> Result<i64, GameError> {
        let updated = sqlx::query(
            "UPDATE rooms \
             SET version = version + 1, listed = $3, document = $4, updated_at = NOW() \
             WHERE id = $1 AND version = $2 \
             RETURNING version",
        )
        .bind(room.id)
        .bind(expected_version)
        .bind(room.is_listed())
        .bind(Json(room))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("save room"))?;

        if let Some(row) = updated {
            return row.try_get("version").map_err(db_error("read version"));
        }

        let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM rooms WHERE id = $1")
            .bind(room.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("read room version"))?;

        match actual {
            Some(actual) => Err(GameError::VersionConflict {
                room_id: room.id,
                expected: expected_version,
                actual,
            }),
            None => Err(GameError::RoomNotFound(room.id)),
        }
    }

    async fn list_open_rooms(&self, limit: usize) -> Result<Vec<Room>, GameError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let documents: Vec<Json<Room>> = sqlx::query_scalar(
            "SELECT document FROM rooms WHERE listed ORDER BY created_at ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list open rooms"))?;

        Ok(documents.into_iter().map(|Json(room)| room).collect())
    }

    async fn stage_answer(&self, answer: StagedAnswer) -> Result<(), GameError> {
        sqlx::query(
            "INSERT INTO staged_answers \
             (submission_id, room_id, author_id, round_number, text, submitted_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(answer.submission_id)
        .bind(answer.room_id)
        .bind(&answer.author_id)
        .bind(i64::from(answer.round_number))
        .bind(&answer.text)
        .bind(answer.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("stage answer"))?;
        Ok(())
    }

    async fn staged_answers(&self, room_id: Uuid) -> Result<Vec<StagedAnswer>, GameError> {
        let rows = sqlx::query(
            "SELECT submission_id, author_id, round_number, text, submitted_at FROM staged_answers \
             WHERE room_id = $1 ORDER BY round_number, submitted_at",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("load staged answers"))?;

        rows.into_iter()
            .map(|row| -> Result<StagedAnswer, GameError> {
                let round_number: i64 = row.try_get("round_number").map_err(db_error("read round"))?;
                let submitted_at: DateTime<Utc> =
                    row.try_get("submitted_at").map_err(db_error("read submitted_at"))?;
                Ok(StagedAnswer {
                    submission_id: row
                        .try_get("submission_id")
                        .map_err(db_error("read submission_id"))?,
                    room_id,
                    author_id: row.try_get("author_id").map_err(db_error("read author"))?,
                    round_number: u32::try_from(round_number).map_err(|_| {
                        GameError::Infrastructure(format!("round number out of range: {round_number}"))
                    })?,
                    text: row.try_get("text").map_err(db_error("read text"))?,
                    submitted_at,
                })
            })
            .collect()
    }

    async fn discard_staged_answer(
        &self,
        room_id: Uuid,
        submission_id: Uuid,
    ) -> Result<bool, GameError> {
        let result =
            sqlx::query("DELETE FROM staged_answers WHERE room_id = $1 AND submission_id = $2")
                .bind(room_id)
                .bind(submission_id)
                .execute(&self.pool)
                .await
                .map_err(db_error("discard staged answer"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn discard_staged(&self, room_id: Uuid, through_round: u32) -> Result<u64, GameError> {
        let result =
            sqlx::query("DELETE FROM staged_answers WHERE room_id = $1 AND round_number <= $2")
                .bind(room_id)
                .bind(i64::from(through_round))
                .execute(&self.pool)
                .await
                .map_err(db_error("discard staged answers"))?;
        Ok(result.rows_affected())
    }
}

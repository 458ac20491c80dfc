//! `PostgreSQL` implementation of the `ArchiveSink` trait.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;

use imposter_core::archive::{ArchiveSink, GameRecord};
use imposter_core::error::CollaboratorError;
use imposter_core::model::Winner;

/// Writes finished games to the `game_results` table. A second record for
/// the same room is ignored.
#[derive(Debug, Clone)]
pub struct PgArchiveSink {
    pool: PgPool,
}

impl PgArchiveSink {
    /// Creates a new `PgArchiveSink`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArchiveSink for PgArchiveSink {
    async fn archive(&self, record: &GameRecord) -> Result<(), CollaboratorError> {
        let winner = match record.winner {
            Winner::Humans => "humans",
            Winner::Ai => "ai",
        };
        let result = sqlx::query(
            "INSERT INTO game_results (room_id, ended_at, winner, record) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (room_id) DO NOTHING",
        )
        .bind(record.room_id)
        .bind(record.ended_at)
        .bind(winner)
        .bind(Json(record))
        .execute(&self.pool)
        .await
        .map_err(|e| CollaboratorError::Unavailable(format!("archive insert failed: {e}")))?;

        if result.rows_affected() == 0 {
            debug!(room_id = %record.room_id, "game already archived");
        }
        Ok(())
    }
}

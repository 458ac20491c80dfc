//! Database schema.
//!
//! The SQL lives in the workspace `migrations/` directory and is embedded
//! here at compile time.

use sqlx::migrate::Migrator;

/// Migrations creating the `rooms`, `staged_answers` and `game_results`
/// tables.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

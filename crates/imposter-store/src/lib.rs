//! Imposter Store: `PostgreSQL` adapters.
//!
//! Implements the room store and the archive sink on top of sqlx. Room
//! documents are stored as JSONB next to a version column used for
//! conditional writes.

pub mod pg_archive_sink;
pub mod pg_room_store;
pub mod schema;

//! Optimistic read-modify-write over the room store.
//!
//! A transaction loads the room and its version, hands it to a synchronous
//! closure that decides what to do, and commits with a conditional write. A
//! version conflict reloads and runs the closure again, so the closure must
//! compute everything from the room it is given.

use imposter_core::error::GameError;
use imposter_core::model::Room;
use imposter_core::store::{RoomStore, StagedAnswer, VersionedRoom};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::settings::RetryPolicy;

/// What the transaction closure decided.
#[derive(Debug)]
pub enum Decision<T> {
    /// Write the modified room.
    Commit(T),
    /// Leave the room untouched; the closure must not have modified it.
    Skip(T),
}

/// Result of a finished transaction.
#[derive(Debug)]
pub struct Committed<T> {
    /// Value returned by the closure on its final run.
    pub value: T,
    /// The room as committed (or as read, when nothing was written).
    pub room: Room,
    /// Whether this transaction wrote the room.
    pub written: bool,
}

/// Runs `apply` against the latest room until its decision commits.
///
/// # Errors
///
/// Returns `GameError::RoomNotFound` if the room does not exist, whatever
/// `apply` returns, store errors, or `GameError::Conflict` once
/// `retry.max_attempts` conditional writes have lost.
pub async fn transact<T, F>(
    store: &dyn RoomStore,
    retry: RetryPolicy,
    room_id: Uuid,
    mut apply: F,
) -> Result<Committed<T>, GameError>
where
    F: FnMut(&mut Room) -> Result<Decision<T>, GameError>,
{
    run(store, retry, room_id, false, |room, _| apply(room)).await
}

/// Like [`transact`], but also reads the staging log after each load and
/// passes it to `apply`.
///
/// # Errors
///
/// Same as [`transact`].
pub async fn transact_with_staged<T, F>(
    store: &dyn RoomStore,
    retry: RetryPolicy,
    room_id: Uuid,
    apply: F,
) -> Result<Committed<T>, GameError>
where
    F: FnMut(&mut Room, &[StagedAnswer]) -> Result<Decision<T>, GameError>,
{
    run(store, retry, room_id, true, apply).await
}

async fn run<T, F>(
    store: &dyn RoomStore,
    retry: RetryPolicy,
    room_id: Uuid,
    read_staged: bool,
    mut apply: F,
) -> Result<Committed<T>, GameError>
where
    F: FnMut(&mut Room, &[StagedAnswer]) -> Result<Decision<T>, GameError>,
{
    let max_attempts = retry.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let VersionedRoom { mut room, version } = store
            .load_room(room_id)
            .await?
            .ok_or(GameError::RoomNotFound(room_id))?;
        // The staging log is read after the room so that every uid the room
        // marks as answered has its row visible here.
        let staged = if read_staged {
            store.staged_answers(room_id).await?
        } else {
            Vec::new()
        };

        let value = match apply(&mut room, &staged)? {
            Decision::Skip(value) => {
                debug!(%room_id, version, "transaction skipped, nothing to write");
                return Ok(Committed {
                    value,
                    room,
                    written: false,
                });
            }
            Decision::Commit(value) => value,
        };

        match store.save_room(&room, version).await {
            Ok(_) => {
                return Ok(Committed {
                    value,
                    room,
                    written: true,
                });
            }
            Err(GameError::VersionConflict { actual, .. }) => {
                warn!(%room_id, attempt, expected = version, actual, "version conflict, retrying");
                if attempt < max_attempts {
                    tokio::time::sleep(retry.backoff * attempt).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(GameError::Conflict {
        room_id,
        attempts: max_attempts,
    })
}

//! Hand-off of finished games to the archive.

use chrono::{DateTime, Utc};
use imposter_core::archive::GameRecord;
use imposter_core::model::Room;
use tracing::{Instrument, info, info_span, warn};

use crate::application::context::GameContext;
use crate::settings::AiDispatch;

/// Builds the archive record of a finished room. `None` while no winner is
/// recorded.
#[must_use]
pub fn build_game_record(room: &Room, ended_at: DateTime<Utc>) -> Option<GameRecord> {
    let winner = room.winner?;
    let mut votes = room.vote_history.clone();
    votes.extend(room.votes.iter().cloned());

    Some(GameRecord {
        room_id: room.id,
        ended_at,
        language: room.language,
        ai_model_id: room.ai_model_id.clone(),
        winner,
        total_rounds: room.current_round,
        players: room.players.clone(),
        rounds: room.rounds.clone(),
        votes,
        last_round_result: room.last_round_result.clone(),
    })
}

/// Sends the final snapshot to the archive sink. Failures are logged and
/// never reach the caller.
pub async fn hand_off(ctx: &GameContext, room: &Room) {
    let Some(record) = build_game_record(room, ctx.clock.now()) else {
        warn!(room_id = %room.id, "finished room has no winner, not archiving");
        return;
    };

    match ctx.settings.ai_dispatch {
        AiDispatch::Inline => deliver(ctx, &record).await,
        AiDispatch::Background => {
            let ctx = ctx.clone();
            let span = info_span!("archive", room_id = %record.room_id);
            tokio::spawn(async move { deliver(&ctx, &record).await }.instrument(span));
        }
    }
}

async fn deliver(ctx: &GameContext, record: &GameRecord) {
    match ctx.archive.archive(record).await {
        Ok(()) => info!(room_id = %record.room_id, winner = ?record.winner, "game archived"),
        Err(e) => warn!(room_id = %record.room_id, error = %e, "failed to archive game"),
    }
}

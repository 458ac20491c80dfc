//! Room lifecycle: create, join and start.

use imposter_core::error::GameError;
use imposter_core::model::{Player, Room, RoomStatus};
use tracing::info;
use uuid::Uuid;

use crate::application::ai_turns;
use crate::application::context::GameContext;
use crate::application::transaction::{Decision, transact};
use crate::domain::commands::{CreateRoom, JoinRoom, StartRoom};
use crate::domain::{models, rules};

/// Handles the `CreateRoom` command: validates the room settings and
/// inserts a waiting room seating only the host.
///
/// # Errors
///
/// Returns `GameError::InvalidConfig` for an unusable impostor count or a
/// model missing from the catalog, `GameError::InvalidInput` for a blank host id, or a store error.
pub async fn handle_create_room(command: &CreateRoom, ctx: &GameContext) -> Result<Uuid, GameError> {
    let settings = &ctx.settings;
    if command.host_id.trim().is_empty() {
        return Err(GameError::InvalidInput("host id must not be blank".into()));
    }
    if command.impostor_count < 1 {
        return Err(GameError::InvalidConfig(
            "a room needs at least one impostor".into(),
        ));
    }
    if command.impostor_count > settings.max_impostors {
        return Err(GameError::InvalidConfig(format!(
            "at most {} impostors are allowed",
            settings.max_impostors
        )));
    }
    if settings.human_capacity(command.impostor_count) < settings.min_players {
        return Err(GameError::InvalidConfig(format!(
            "{} impostors leave fewer than {} human seats",
            command.impostor_count, settings.min_players
        )));
    }

    let ai_model_id = command
        .ai_model_id
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(settings.default_model_id.as_str());
    if models::find_model(ai_model_id).is_none() {
        return Err(GameError::InvalidConfig(format!(
            "AI model `{ai_model_id}` is not supported"
        )));
    }

    let room = Room::new(
        Uuid::new_v4(),
        command.host_id.clone(),
        command.language,
        command.privacy,
        command.impostor_count,
        ai_model_id,
        ctx.clock.now(),
    );
    ctx.store.insert_room(&room).await?;

    info!(
        room_id = %room.id,
        correlation_id = %command.correlation_id,
        impostors = room.impostor_count,
        "room created"
    );
    Ok(room.id)
}

/// Handles the `JoinRoom` command: appends an unnamed human seat.
///
/// # Errors
///
/// Returns `GameError::RoomNotFound`, `GameError::RoomNotJoinable` when the
/// game started or the player is already seated, `GameError::RoomFull`, or
/// a store error.
pub async fn handle_join_room(command: &JoinRoom, ctx: &GameContext) -> Result<(), GameError> {
    if command.player_id.trim().is_empty() {
        return Err(GameError::InvalidInput("player id must not be blank".into()));
    }
    let settings = &ctx.settings;

    transact(
        ctx.store.as_ref(),
        settings.retry,
        command.room_id,
        |room| {
            if room.status != RoomStatus::Waiting {
                return Err(GameError::RoomNotJoinable("game already started".into()));
            }
            if room.player(&command.player_id).is_some() {
                return Err(GameError::RoomNotJoinable("player already joined".into()));
            }
            let capacity = settings.human_capacity(room.impostor_count);
            if room.players.len() >= capacity {
                return Err(GameError::RoomFull { capacity });
            }
            room.players.push(Player::human(command.player_id.clone()));
            Ok(Decision::Commit(()))
        },
    )
    .await?;

    info!(
        room_id = %command.room_id,
        correlation_id = %command.correlation_id,
        player_id = %command.player_id,
        "player joined"
    );
    Ok(())
}

/// Handles the `StartRoom` command: seats the impostors, names everyone and
/// opens round 1. AI answers for round 1 are requested after the commit.
///
/// # Errors
///
/// Returns `GameError::NotHost`, `GameError::InvalidState` if the room
/// already started, `GameError::TooFewPlayers`, or a store error.
pub async fn handle_start_room(command: &StartRoom, ctx: &GameContext) -> Result<Room, GameError> {
    let settings = &ctx.settings;
    let now = ctx.clock.now();

    let committed = transact(
        ctx.store.as_ref(),
        settings.retry,
        command.room_id,
        |room| {
            if room.host_id != command.caller_id {
                return Err(GameError::NotHost);
            }
            if room.status != RoomStatus::Waiting {
                return Err(GameError::InvalidState("room already started".into()));
            }
            let humans = room.players.iter().filter(|p| !p.is_impostor).count();
            if humans < settings.min_players {
                return Err(GameError::TooFewPlayers {
                    required: settings.min_players,
                    actual: humans,
                });
            }
            ctx.with_rng(|rng| rules::start_game(room, now, settings, rng))?;
            Ok(Decision::Commit(()))
        },
    )
    .await?;

    let room = committed.room;
    info!(
        room_id = %room.id,
        correlation_id = %command.correlation_id,
        seats = room.players.len(),
        "game started"
    );
    ai_turns::dispatch(ctx, &room).await;
    Ok(room)
}

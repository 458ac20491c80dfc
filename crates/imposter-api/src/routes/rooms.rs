//! Routes for rooms: lobby, lifecycle, answers and votes.
//!
//! The caller's uid arrives in the `x-player-id` header; authenticating it
//! is the job of whatever sits in front of this service.

use axum::extract::{FromRequestParts, OptionalFromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use imposter_core::command::Command;
use imposter_core::error::GameError;
use imposter_core::model::{
    Language, Privacy, RevealedAnswer, Room, RoomStatus, Round, RoundPhase, RoundResult, Vote,
    Winner,
};
use imposter_game::application::outcomes::{AnswerReceipt, PhaseAdvance, VoteReceipt};
use imposter_game::application::query_handlers::{self, OpenRoomView};
use imposter_game::application::{answers, lifecycle, votes};
use imposter_game::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the authenticated caller uid.
pub const PLAYER_ID_HEADER: &str = "x-player-id";

const DEFAULT_LISTING: usize = 20;

/// The uid of the player making the request.
#[derive(Debug, Clone)]
pub struct CallerId(pub String);

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uid = parts
            .headers
            .get(PLAYER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| {
                GameError::InvalidInput(format!("missing {PLAYER_ID_HEADER} header"))
            })?;
        Ok(Self(uid.to_owned()))
    }
}

impl<S> OptionalFromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(PLAYER_ID_HEADER) {
            return Ok(None);
        }
        <Self as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}

fn log_command(command: &impl Command) {
    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        room_id = ?command.room_id(),
        actor_id = command.actor_id(),
        "handling command"
    );
}

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    /// Question language.
    pub language: Language,
    /// Number of AI seats.
    pub impostor_count: usize,
    /// Lobby visibility; public when omitted.
    #[serde(default = "default_privacy")]
    pub privacy: Privacy,
    /// Model for the AI seats; server default when omitted.
    pub ai_model_id: Option<String>,
}

fn default_privacy() -> Privacy {
    Privacy::Public
}

/// Response body for POST /.
#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    /// The new room.
    pub room_id: Uuid,
}

/// Query string for GET /.
#[derive(Debug, Deserialize)]
pub struct ListRoomsParams {
    /// Maximum number of rooms to return.
    pub limit: Option<usize>,
}

/// Request body for POST /{room_id}/answers.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    /// Answer text.
    pub text: String,
}

/// Request body for POST /{room_id}/votes.
#[derive(Debug, Deserialize)]
pub struct SubmitVoteRequest {
    /// Seat id of the suspected impostor.
    pub target_id: String,
}

/// Maps uids to the ids clients see. Seat ids are drawn for every seat when
/// the game starts and never change afterwards; a waiting room holds only
/// humans, so its seats are shown by uid.
struct PublicIds(Vec<(String, String)>);

impl PublicIds {
    fn of(room: &Room) -> Self {
        Self(
            room.players
                .iter()
                .map(|p| {
                    let public = p.seat_id.map_or_else(|| p.uid.clone(), |id| id.to_string());
                    (p.uid.clone(), public)
                })
                .collect(),
        )
    }

    fn public(&self, uid: &str) -> String {
        self.0
            .iter()
            .find(|(u, _)| u == uid)
            .map_or_else(|| uid.to_owned(), |(_, public)| public.clone())
    }

    fn uid(&self, public: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, p)| p == public)
            .map(|(uid, _)| uid.as_str())
    }

    fn vote(&self, vote: Vote) -> Vote {
        Vote {
            voter_id: self.public(&vote.voter_id),
            target_id: self.public(&vote.target_id),
            round: vote.round,
        }
    }

    fn round(&self, round: Round) -> RoundView {
        RoundView {
            number: round.number,
            question: round.question,
            answered_by: round.answered_by.iter().map(|uid| self.public(uid)).collect(),
            revealed_answers: round
                .revealed_answers
                .into_iter()
                .map(|answer| RevealedAnswer {
                    player_id: self.public(&answer.player_id),
                    ..answer
                })
                .collect(),
        }
    }

    fn result(&self, result: RoundResult) -> RoundResult {
        RoundResult {
            vote_counts: result
                .vote_counts
                .into_iter()
                .map(|(uid, count)| (self.public(&uid), count))
                .collect(),
            eliminated_player_id: result.eliminated_player_id.map(|uid| self.public(&uid)),
            ..result
        }
    }
}

/// A seat as shown to clients.
#[derive(Debug, Serialize)]
pub struct PlayerView {
    /// Seat id once the game started; the uid while the room is waiting.
    pub id: String,
    /// Nickname; `None` until the game starts.
    pub display_name: Option<String>,
    /// Only disclosed once the seat is eliminated or the game is over.
    pub is_impostor: Option<bool>,
    /// Whether the seat was voted out.
    pub is_eliminated: bool,
}

/// A round as shown to clients.
#[derive(Debug, Serialize)]
pub struct RoundView {
    /// 1-based round number.
    pub number: u32,
    /// The question everyone answers.
    pub question: String,
    /// Seats that answered so far.
    pub answered_by: Vec<String>,
    /// Answers made public by the reveal.
    pub revealed_answers: Vec<RevealedAnswer>,
}

/// The room document with hidden roles masked. Every player reference is a
/// public seat id, never a uid.
#[derive(Debug, Serialize)]
pub struct RoomView {
    /// Room identifier.
    pub room_id: Uuid,
    /// Seat of the player who created the room.
    pub host_id: String,
    /// Seat of the caller, when the request named a seated player.
    pub you: Option<String>,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Current phase.
    pub round_phase: RoundPhase,
    /// Question language.
    pub language: Language,
    /// Lobby visibility.
    pub privacy: Privacy,
    /// Number of AI seats.
    pub impostor_count: usize,
    /// Model the AI seats use.
    pub ai_model_id: String,
    /// Current round number.
    pub current_round: u32,
    /// When the current phase opened.
    pub round_start_time: Option<DateTime<Utc>>,
    /// Deadline of the current phase.
    pub round_end_time: Option<DateTime<Utc>>,
    /// Seats in display order.
    pub players: Vec<PlayerView>,
    /// Questions and revealed answers.
    pub rounds: Vec<RoundView>,
    /// Votes of the current round.
    pub votes: Vec<Vote>,
    /// Summary of the most recent tally.
    pub last_round_result: Option<RoundResult>,
    /// Winner, once finished.
    pub winner: Option<Winner>,
}

impl RoomView {
    /// Builds the view of `room` for `caller`.
    #[must_use]
    pub fn new(room: Room, caller: Option<&str>) -> Self {
        let ids = PublicIds::of(&room);
        let finished = room.status == RoomStatus::Finished;
        let you = caller
            .filter(|uid| room.player(uid).is_some())
            .map(|uid| ids.public(uid));
        let players = room
            .players
            .iter()
            .map(|p| PlayerView {
                id: ids.public(&p.uid),
                display_name: p.display_name.clone(),
                is_impostor: (finished || p.is_eliminated).then_some(p.is_impostor),
                is_eliminated: p.is_eliminated,
            })
            .collect();
        Self {
            room_id: room.id,
            host_id: ids.public(&room.host_id),
            you,
            status: room.status,
            round_phase: room.round_phase,
            language: room.language,
            privacy: room.privacy,
            impostor_count: room.impostor_count,
            ai_model_id: room.ai_model_id,
            current_round: room.current_round,
            round_start_time: room.round_start_time,
            round_end_time: room.round_end_time,
            players,
            rounds: room.rounds.into_iter().map(|r| ids.round(r)).collect(),
            votes: room.votes.into_iter().map(|v| ids.vote(v)).collect(),
            last_round_result: room.last_round_result.map(|r| ids.result(r)),
            winner: room.winner,
        }
    }
}

/// POST /
#[instrument(skip(state, caller, request), fields(host_id = %caller.0))]
async fn create_room(
    State(state): State<AppState>,
    caller: CallerId,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), ApiError> {
    let command = commands::CreateRoom {
        correlation_id: Uuid::new_v4(),
        host_id: caller.0,
        language: request.language,
        impostor_count: request.impostor_count,
        privacy: request.privacy,
        ai_model_id: request.ai_model_id,
    };

    log_command(&command);

    let room_id = lifecycle::handle_create_room(&command, &state.game).await?;

    Ok((StatusCode::CREATED, Json(CreateRoomResponse { room_id })))
}

/// GET /
async fn list_rooms(
    State(state): State<AppState>,
    Query(params): Query<ListRoomsParams>,
) -> Result<Json<Vec<OpenRoomView>>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LISTING)
        .min(state.max_listing);
    let rooms =
        query_handlers::list_open_rooms(limit, &*state.game.store, &state.game.settings).await?;
    Ok(Json(rooms))
}

/// GET /{room_id}
async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    caller: Option<CallerId>,
) -> Result<Json<RoomView>, ApiError> {
    let room = query_handlers::get_room(room_id, &*state.game.store).await?;
    let caller = caller.map(|c| c.0);
    Ok(Json(RoomView::new(room, caller.as_deref())))
}

/// POST /{room_id}/join
#[instrument(skip(state, caller), fields(room_id = %room_id, player_id = %caller.0))]
async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    caller: CallerId,
) -> Result<StatusCode, ApiError> {
    let command = commands::JoinRoom {
        correlation_id: Uuid::new_v4(),
        room_id,
        player_id: caller.0,
    };

    log_command(&command);

    lifecycle::handle_join_room(&command, &state.game).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /{room_id}/start
#[instrument(skip(state, caller), fields(room_id = %room_id, caller_id = %caller.0))]
async fn start_room(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    caller: CallerId,
) -> Result<Json<RoomView>, ApiError> {
    let command = commands::StartRoom {
        correlation_id: Uuid::new_v4(),
        room_id,
        caller_id: caller.0,
    };

    log_command(&command);

    let room = lifecycle::handle_start_room(&command, &state.game).await?;

    Ok(Json(RoomView::new(room, Some(&command.caller_id))))
}

/// POST /{room_id}/answers
#[instrument(skip(state, caller, request), fields(room_id = %room_id, player_id = %caller.0))]
async fn submit_answer(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    caller: CallerId,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<Json<AnswerReceipt>, ApiError> {
    let command = commands::SubmitAnswer {
        correlation_id: Uuid::new_v4(),
        room_id,
        player_id: caller.0,
        text: request.text,
    };

    log_command(&command);

    let receipt = answers::handle_submit_answer(&command, &state.game).await?;

    Ok(Json(receipt))
}

/// POST /{room_id}/answers/tally
#[instrument(skip(state, caller), fields(room_id = %room_id, caller_id = %caller.0))]
async fn tally_answers(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    caller: CallerId,
) -> Result<Json<PhaseAdvance>, ApiError> {
    let command = commands::TallyAnswers {
        correlation_id: Uuid::new_v4(),
        room_id,
        caller_id: caller.0,
    };

    log_command(&command);

    let advance = answers::handle_tally_answers(&command, &state.game).await?;

    Ok(Json(advance))
}

/// POST /{room_id}/votes
#[instrument(skip(state, caller, request), fields(room_id = %room_id, voter_id = %caller.0))]
async fn submit_vote(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    caller: CallerId,
    Json(request): Json<SubmitVoteRequest>,
) -> Result<Json<VoteReceipt>, ApiError> {
    // Seat ids are fixed once the game starts, so this read cannot go stale.
    let room = query_handlers::get_room(room_id, &*state.game.store).await?;
    let ids = PublicIds::of(&room);
    let target_id = ids
        .uid(&request.target_id)
        .map_or(request.target_id, str::to_owned);

    let command = commands::SubmitVote {
        correlation_id: Uuid::new_v4(),
        room_id,
        voter_id: caller.0,
        target_id,
    };

    log_command(&command);

    let mut receipt = votes::handle_submit_vote(&command, &state.game).await?;
    receipt.tally = receipt.tally.map(|result| ids.result(result));

    Ok(Json(receipt))
}

/// POST /{room_id}/votes/tally
#[instrument(skip(state, caller), fields(room_id = %room_id, caller_id = %caller.0))]
async fn tally_votes(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    caller: CallerId,
) -> Result<Json<PhaseAdvance>, ApiError> {
    let command = commands::TallyVotes {
        correlation_id: Uuid::new_v4(),
        room_id,
        caller_id: caller.0,
    };

    log_command(&command);

    let advance = match votes::handle_tally_votes(&command, &state.game).await? {
        PhaseAdvance::Advanced {
            round,
            phase,
            result: Some(result),
        } => {
            let room = query_handlers::get_room(room_id, &*state.game.store).await?;
            PhaseAdvance::Advanced {
                round,
                phase,
                result: Some(PublicIds::of(&room).result(result)),
            }
        }
        other => other,
    };

    Ok(Json(advance))
}

/// Returns the router for rooms.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_room).get(list_rooms))
        .route("/{room_id}", get(get_room))
        .route("/{room_id}/join", post(join_room))
        .route("/{room_id}/start", post(start_room))
        .route("/{room_id}/answers", post(submit_answer))
        .route("/{room_id}/answers/tally", post(tally_answers))
        .route("/{room_id}/votes", post(submit_vote))
        .route("/{room_id}/votes/tally", post(tally_votes))
}

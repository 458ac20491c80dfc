//! Answer staging and reveal.
//!
//! Submitting an answer writes its text to the staging log first and only
//! then marks the author and the accepted submission on the room. The
//! reveal reads the log after loading the room, so every author the room
//! lists has its text available. Texts never appear on the room before the
//! reveal.

use imposter_core::error::GameError;
use imposter_core::model::{Room, RoomStatus, RoundPhase};
use imposter_core::store::StagedAnswer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::ai_turns;
use crate::application::context::GameContext;
use crate::application::outcomes::{AnswerReceipt, PhaseAdvance};
use crate::application::transaction::{Decision, transact, transact_with_staged};
use crate::domain::commands::{SubmitAnswer, TallyAnswers};
use crate::domain::phase_clock::is_expired;
use crate::domain::rules;

/// Outcome of marking an author as answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AnswerMark {
    /// The author is now listed for the round.
    Recorded(AnswerReceipt),
    /// The round or phase moved on before the mark landed.
    Stale,
    /// The author was already listed.
    Duplicate,
}

fn mark_answered(
    room: &mut Room,
    author_id: &str,
    round: u32,
    submission_id: Uuid,
) -> Decision<AnswerMark> {
    if room.round_phase != RoundPhase::AnswerSubmission || room.current_round != round {
        return Decision::Skip(AnswerMark::Stale);
    }
    let Some(entry) = room.current_round_entry_mut() else {
        return Decision::Skip(AnswerMark::Stale);
    };
    if entry.has_answered(author_id) {
        return Decision::Skip(AnswerMark::Duplicate);
    }
    entry.answered_by.push(author_id.to_owned());
    entry.submissions.insert(author_id.to_owned(), submission_id);
    Decision::Commit(AnswerMark::Recorded(AnswerReceipt {
        round,
        all_answered: rules::all_answers_in(room),
    }))
}

/// Stages `text` for `author_id` in `round` under a fresh submission id,
/// then lists the author on the room together with that id. A submission
/// that does not end up listed is removed from the staging log again, so
/// only the accepted text can be revealed.
pub(crate) async fn stage_and_mark(
    ctx: &GameContext,
    room_id: Uuid,
    author_id: &str,
    round: u32,
    text: String,
) -> Result<AnswerMark, GameError> {
    let submission_id = Uuid::new_v4();
    ctx.store
        .stage_answer(StagedAnswer {
            submission_id,
            room_id,
            author_id: author_id.to_owned(),
            round_number: round,
            text,
            submitted_at: ctx.clock.now(),
        })
        .await?;

    let marked = transact(ctx.store.as_ref(), ctx.settings.retry, room_id, |room| {
        Ok(mark_answered(room, author_id, round, submission_id))
    })
    .await
    .map(|committed| committed.value);

    if matches!(marked, Ok(AnswerMark::Recorded(_))) {
        return marked;
    }
    if let Err(e) = ctx.store.discard_staged_answer(room_id, submission_id).await {
        warn!(%room_id, %submission_id, error = %e, "failed to discard rejected answer");
    }
    marked
}

fn normalize_answer(text: &str, max_chars: usize) -> Result<String, GameError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GameError::InvalidInput("answer must not be blank".into()));
    }
    Ok(trimmed.chars().take(max_chars).collect())
}

/// Handles the `SubmitAnswer` command for a human player.
///
/// # Errors
///
/// Returns `GameError::InvalidInput` for a blank answer,
/// `GameError::RoomNotFound`, `GameError::NotAnswerPhase`,
/// `GameError::Forbidden` for players who may not answer,
/// `GameError::AlreadyAnswered`, or a store error.
pub async fn handle_submit_answer(
    command: &SubmitAnswer,
    ctx: &GameContext,
) -> Result<AnswerReceipt, GameError> {
    let text = normalize_answer(&command.text, ctx.settings.max_answer_chars)?;

    let room = ctx
        .store
        .load_room(command.room_id)
        .await?
        .ok_or(GameError::RoomNotFound(command.room_id))?
        .room;
    if room.status != RoomStatus::InProgress || room.round_phase != RoundPhase::AnswerSubmission {
        return Err(GameError::NotAnswerPhase);
    }
    let Some(player) = room.player(&command.player_id) else {
        return Err(GameError::Forbidden("not a player in this room".into()));
    };
    if player.is_impostor {
        return Err(GameError::Forbidden("AI seats answer through the generator".into()));
    }
    if !player.is_active() {
        return Err(GameError::Forbidden("eliminated players cannot answer".into()));
    }
    if room
        .current_round_entry()
        .is_some_and(|r| r.has_answered(&command.player_id))
    {
        return Err(GameError::AlreadyAnswered);
    }

    let round = room.current_round;
    match stage_and_mark(ctx, command.room_id, &command.player_id, round, text).await? {
        AnswerMark::Recorded(receipt) => {
            info!(
                room_id = %command.room_id,
                correlation_id = %command.correlation_id,
                round,
                all_answered = receipt.all_answered,
                "answer staged"
            );
            Ok(receipt)
        }
        AnswerMark::Duplicate => Err(GameError::AlreadyAnswered),
        AnswerMark::Stale => Err(GameError::NotAnswerPhase),
    }
}

/// Handles the `TallyAnswers` command: reveals the round's answers once the
/// deadline passed or everybody answered, then moves the room on. A room
/// whose answer phase already closed is left unchanged.
///
/// # Errors
///
/// Returns `GameError::RoomNotFound`, `GameError::Forbidden` for callers
/// outside the room, `GameError::InvalidState` for a room that has not
/// started, `GameError::PhaseNotExpired`, or a store error.
pub async fn handle_tally_answers(
    command: &TallyAnswers,
    ctx: &GameContext,
) -> Result<PhaseAdvance, GameError> {
    let settings = &ctx.settings;
    let now = ctx.clock.now();

    let committed = transact_with_staged(
        ctx.store.as_ref(),
        settings.retry,
        command.room_id,
        |room, staged| {
            if room.player(&command.caller_id).is_none() {
                return Err(GameError::Forbidden("not a player in this room".into()));
            }
            if room.status == RoomStatus::Waiting {
                return Err(GameError::InvalidState("game has not started".into()));
            }
            if room.round_phase != RoundPhase::AnswerSubmission {
                return Ok(Decision::Skip(None));
            }
            if !is_expired(now, room.round_end_time) && !rules::all_answers_in(room) {
                return Err(GameError::PhaseNotExpired);
            }

            let revealed_round = room.current_round;
            let missing = ctx.with_rng(|rng| {
                Ok(rules::close_answer_phase(room, staged, now, settings, rng))
            })?;
            Ok(Decision::Commit(Some((revealed_round, missing))))
        },
    )
    .await?;

    let Some((revealed_round, missing)) = committed.value else {
        debug!(room_id = %command.room_id, "answer phase already closed");
        return Ok(PhaseAdvance::Unchanged);
    };
    let room = committed.room;

    if !missing.is_empty() {
        warn!(room_id = %room.id, round = revealed_round, ?missing, "answers missing from staging log");
    }
    info!(
        room_id = %room.id,
        correlation_id = %command.correlation_id,
        revealed_round,
        round = room.current_round,
        phase = ?room.round_phase,
        "answers revealed"
    );

    if let Err(e) = ctx.store.discard_staged(room.id, revealed_round).await {
        warn!(room_id = %room.id, error = %e, "failed to discard staged answers");
    }
    if room.round_phase == RoundPhase::AnswerSubmission {
        ai_turns::dispatch(ctx, &room).await;
    }

    Ok(PhaseAdvance::Advanced {
        round: room.current_round,
        phase: room.round_phase,
        result: None,
    })
}

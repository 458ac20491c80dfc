//! Answer generation for AI seats.
//!
//! Runs after the transaction that opened an answer round has committed.
//! Each answer goes through the same stage-then-mark path as a human
//! answer, so a round that moved on in the meantime simply ignores it.

use imposter_core::generator::{AnswerContext, PriorAnswer, PriorRound};
use imposter_core::model::{Player, Room, RoundPhase};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::application::answers::{AnswerMark, stage_and_mark};
use crate::application::context::GameContext;
use crate::domain::questions::fallback_answer;
use crate::settings::AiDispatch;

/// Builds what the generator sees when answering for `player` in the
/// room's current round. Only revealed rounds are shared.
#[must_use]
pub fn build_answer_context(room: &Room, player: &Player, max_rounds: u32) -> Option<AnswerContext> {
    let round = room.current_round_entry()?;

    let prior_rounds = room
        .rounds
        .iter()
        .filter(|r| r.number < room.current_round && !r.revealed_answers.is_empty())
        .map(|r| PriorRound {
            number: r.number,
            question: r.question.clone(),
            answers: r
                .revealed_answers
                .iter()
                .map(|a| PriorAnswer {
                    nickname: a
                        .display_name
                        .clone()
                        .unwrap_or_else(|| a.player_id.clone()),
                    from_impostor: room.player(&a.player_id).is_some_and(|p| p.is_impostor),
                    text: a.text.clone(),
                })
                .collect(),
        })
        .collect();

    Some(AnswerContext {
        room_id: room.id,
        round_number: round.number,
        max_rounds,
        question: round.question.clone(),
        language: room.language.code().to_owned(),
        model_id: room.ai_model_id.clone(),
        player_nickname: player.label().to_owned(),
        prior_rounds,
    })
}

/// Runs [`run_ai_turns`] in the configured dispatch mode.
pub async fn dispatch(ctx: &GameContext, room: &Room) {
    match ctx.settings.ai_dispatch {
        AiDispatch::Inline => run_ai_turns(ctx, room).await,
        AiDispatch::Background => {
            let ctx = ctx.clone();
            let room = room.clone();
            let span = info_span!("ai_turns", room_id = %room.id, round = room.current_round);
            tokio::spawn(async move { run_ai_turns(&ctx, &room).await }.instrument(span));
        }
    }
}

/// Generates and records an answer for every active AI seat that has not
/// answered the room's current round yet. Never fails: generator errors
/// fall back to a canned answer and store errors are logged.
pub async fn run_ai_turns(ctx: &GameContext, room: &Room) {
    if room.round_phase != RoundPhase::AnswerSubmission {
        return;
    }
    let round = room.current_round;
    let pending: Vec<&Player> = room
        .ai_players()
        .filter(|p| p.is_active())
        .filter(|p| {
            room.current_round_entry()
                .is_none_or(|r| !r.has_answered(&p.uid))
        })
        .collect();

    for player in pending {
        let Some(context) = build_answer_context(room, player, ctx.settings.max_rounds) else {
            continue;
        };

        let text = match ctx.generator.generate(&context).await {
            Ok(text) if !text.trim().is_empty() => text
                .trim()
                .chars()
                .take(ctx.settings.max_answer_chars)
                .collect(),
            Ok(_) => {
                warn!(room_id = %room.id, round, player_id = %player.uid, "generator returned a blank answer, using fallback");
                fallback_answer(room.language, round).to_owned()
            }
            Err(e) => {
                warn!(room_id = %room.id, round, player_id = %player.uid, error = %e, "answer generation failed, using fallback");
                fallback_answer(room.language, round).to_owned()
            }
        };

        match stage_and_mark(ctx, room.id, &player.uid, round, text).await {
            Ok(AnswerMark::Recorded(_)) => {
                info!(room_id = %room.id, round, player_id = %player.uid, "AI answer staged");
            }
            Ok(AnswerMark::Stale | AnswerMark::Duplicate) => {
                debug!(room_id = %room.id, round, player_id = %player.uid, "AI answer no longer needed");
            }
            Err(e) => {
                warn!(room_id = %room.id, round, player_id = %player.uid, error = %e, "failed to record AI answer");
            }
        }
    }
}

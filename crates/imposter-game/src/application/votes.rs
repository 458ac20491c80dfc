//! Vote submission and tally.
//!
//! The vote that completes a round tallies it inside its own transaction,
//! so exactly one committed write closes each voting phase. A conflicting
//! voter retries against the tallied room and sees the phase has moved.

use imposter_core::error::GameError;
use imposter_core::model::{Room, RoomStatus, RoundPhase, RoundResult, Vote};
use tracing::{debug, info};

use crate::application::context::GameContext;
use crate::application::outcomes::{PhaseAdvance, VoteReceipt};
use crate::application::transaction::{Decision, transact};
use crate::application::{ai_turns, archival};
use crate::domain::commands::{SubmitVote, TallyVotes};
use crate::domain::phase_clock::is_expired;
use crate::domain::rules;

fn validate_vote(room: &Room, voter_id: &str, target_id: &str) -> Result<(), GameError> {
    if room.status != RoomStatus::InProgress || room.round_phase != RoundPhase::Voting {
        return Err(GameError::NotVotingPhase);
    }

    let Some(voter) = room.player(voter_id) else {
        return Err(GameError::Forbidden("not a player in this room".into()));
    };
    if voter.is_impostor {
        return Err(GameError::Forbidden("AI seats do not vote".into()));
    }
    if !voter.is_active() {
        return Err(GameError::Forbidden("eliminated players cannot vote".into()));
    }

    if room
        .votes
        .iter()
        .any(|v| v.voter_id == voter_id && v.round == room.current_round)
    {
        return Err(GameError::AlreadyVoted);
    }

    if voter_id == target_id {
        return Err(GameError::InvalidTarget("cannot vote for yourself".into()));
    }
    match room.player(target_id) {
        None => Err(GameError::InvalidTarget(format!("no player {target_id} in this room"))),
        Some(target) if !target.is_active() => Err(GameError::InvalidTarget(format!(
            "{} is already eliminated",
            target.label()
        ))),
        Some(_) => Ok(()),
    }
}

/// Work that follows a committed tally: the next round's AI answers, or the
/// archive hand-off when the game ended.
async fn after_tally(ctx: &GameContext, room: &Room, result: &RoundResult) {
    info!(
        room_id = %room.id,
        round = result.round,
        eliminated = ?result.eliminated_player_id,
        game_ended = result.game_ended,
        "votes tallied"
    );
    if result.game_ended {
        info!(room_id = %room.id, winner = ?room.winner, "game ended");
        archival::hand_off(ctx, room).await;
    } else {
        ai_turns::dispatch(ctx, room).await;
    }
}

/// Handles the `SubmitVote` command. The vote that completes the round
/// tallies it and carries the result on its receipt.
///
/// # Errors
///
/// Returns `GameError::RoomNotFound`, `GameError::NotVotingPhase`,
/// `GameError::Forbidden`, `GameError::AlreadyVoted`,
/// `GameError::InvalidTarget`, `GameError::Conflict`, or a store error.
pub async fn handle_submit_vote(
    command: &SubmitVote,
    ctx: &GameContext,
) -> Result<VoteReceipt, GameError> {
    let settings = &ctx.settings;
    let now = ctx.clock.now();

    let committed = transact(
        ctx.store.as_ref(),
        settings.retry,
        command.room_id,
        |room| {
            validate_vote(room, &command.voter_id, &command.target_id)?;

            let round = room.current_round;
            room.votes.push(Vote {
                voter_id: command.voter_id.clone(),
                target_id: command.target_id.clone(),
                round,
            });

            let tally = if rules::all_votes_in(room) {
                Some(ctx.with_rng(|rng| Ok(rules::conclude_voting(room, now, settings, rng)))?)
            } else {
                None
            };
            Ok(Decision::Commit(VoteReceipt { round, tally }))
        },
    )
    .await?;

    let receipt = committed.value;
    info!(
        room_id = %command.room_id,
        correlation_id = %command.correlation_id,
        round = receipt.round,
        completed_round = receipt.tally.is_some(),
        "vote recorded"
    );
    if let Some(result) = &receipt.tally {
        after_tally(ctx, &committed.room, result).await;
    }
    Ok(receipt)
}

/// Handles the `TallyVotes` command: closes the voting phase once its
/// deadline passed (missing votes simply do not count) or every active
/// human voted. A room that is no longer voting is left unchanged.
///
/// # Errors
///
/// Returns `GameError::RoomNotFound`, `GameError::Forbidden` for callers
/// outside the room, `GameError::InvalidState` for a room that has not
/// started, `GameError::PhaseNotExpired`, or a store error.
pub async fn handle_tally_votes(
    command: &TallyVotes,
    ctx: &GameContext,
) -> Result<PhaseAdvance, GameError> {
    let settings = &ctx.settings;
    let now = ctx.clock.now();

    let committed = transact(
        ctx.store.as_ref(),
        settings.retry,
        command.room_id,
        |room| {
            if room.player(&command.caller_id).is_none() {
                return Err(GameError::Forbidden("not a player in this room".into()));
            }
            if room.status == RoomStatus::Waiting {
                return Err(GameError::InvalidState("game has not started".into()));
            }
            if room.round_phase != RoundPhase::Voting {
                return Ok(Decision::Skip(None));
            }
            if !is_expired(now, room.round_end_time) && !rules::all_votes_in(room) {
                return Err(GameError::PhaseNotExpired);
            }
            let result = ctx.with_rng(|rng| Ok(rules::conclude_voting(room, now, settings, rng)))?;
            Ok(Decision::Commit(Some(result)))
        },
    )
    .await?;

    let Some(result) = committed.value else {
        debug!(room_id = %command.room_id, "voting phase already closed");
        return Ok(PhaseAdvance::Unchanged);
    };
    let room = committed.room;
    after_tally(ctx, &room, &result).await;

    Ok(PhaseAdvance::Advanced {
        round: room.current_round,
        phase: room.round_phase,
        result: Some(result),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;
    use imposter_core::model::{EndCondition, Role, Winner};
    use imposter_core::store::RoomStore;
    use imposter_test_support::{ConflictingRoomStore, FailingArchiveSink, InMemoryRoomStore};

    use crate::application::test_fixtures::{Fixture, context_with_store};

    #[tokio::test]
    async fn test_vote_outside_voting_phase_is_rejected() {
        let fx = Fixture::new();
        let room_id = fx.started_room(&["host", "b"], 1).await;

        let result = handle_submit_vote(&fx.vote_command(room_id, "host", "b"), &fx.ctx).await;

        assert!(matches!(result, Err(GameError::NotVotingPhase)));
    }

    #[tokio::test]
    async fn test_vote_is_recorded_without_tally_until_everyone_voted() {
        let fx = Fixture::new();
        let room_id = fx.voting_room(&["host", "b", "c"], 1).await;

        let receipt = handle_submit_vote(&fx.vote_command(room_id, "host", "b"), &fx.ctx)
            .await
            .unwrap();

        assert_eq!(receipt, VoteReceipt { round: 2, tally: None });
        let room = fx.store.room(room_id).unwrap();
        assert_eq!(room.votes.len(), 1);
        assert_eq!(room.round_phase, RoundPhase::Voting);
    }

    #[tokio::test]
    async fn test_second_vote_from_same_voter_is_already_voted() {
        let fx = Fixture::new();
        let room_id = fx.voting_room(&["host", "b", "c"], 1).await;
        handle_submit_vote(&fx.vote_command(room_id, "host", "b"), &fx.ctx)
            .await
            .unwrap();

        let result = handle_submit_vote(&fx.vote_command(room_id, "host", "c"), &fx.ctx).await;

        assert!(matches!(result, Err(GameError::AlreadyVoted)));
        assert_eq!(fx.store.room(room_id).unwrap().votes.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_targets_are_rejected() {
        let fx = Fixture::new();
        let room_id = fx.voting_room(&["host", "b", "c"], 1).await;

        let own = handle_submit_vote(&fx.vote_command(room_id, "host", "host"), &fx.ctx).await;
        let unknown = handle_submit_vote(&fx.vote_command(room_id, "host", "nobody"), &fx.ctx).await;

        assert!(matches!(own, Err(GameError::InvalidTarget(_))));
        assert!(matches!(unknown, Err(GameError::InvalidTarget(_))));
    }

    #[tokio::test]
    async fn test_ai_and_strangers_cannot_vote() {
        let fx = Fixture::new();
        let room_id = fx.voting_room(&["host", "b", "c"], 1).await;
        let ai = fx.ai_uids(room_id)[0].clone();

        let impostor = handle_submit_vote(&fx.vote_command(room_id, &ai, "host"), &fx.ctx).await;
        let stranger = handle_submit_vote(&fx.vote_command(room_id, "mallory", "host"), &fx.ctx).await;

        assert!(matches!(impostor, Err(GameError::Forbidden(_))));
        assert!(matches!(stranger, Err(GameError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_voting_out_the_only_impostor_ends_the_game_for_humans() {
        // Arrange: one impostor and four humans in round 2.
        let fx = Fixture::new();
        let room_id = fx.voting_room(&["h1", "h2", "h3", "h4"], 1).await;
        let ai = fx.ai_uids(room_id)[0].clone();

        // Act: impostor 3, h1 1.
        handle_submit_vote(&fx.vote_command(room_id, "h1", &ai), &fx.ctx)
            .await
            .unwrap();
        handle_submit_vote(&fx.vote_command(room_id, "h2", &ai), &fx.ctx)
            .await
            .unwrap();
        handle_submit_vote(&fx.vote_command(room_id, "h3", &ai), &fx.ctx)
            .await
            .unwrap();
        let receipt = handle_submit_vote(&fx.vote_command(room_id, "h4", "h1"), &fx.ctx)
            .await
            .unwrap();

        // Assert
        let result = receipt.tally.unwrap();
        assert_eq!(result.eliminated_player_id.as_deref(), Some(ai.as_str()));
        assert_eq!(result.eliminated_role, Some(Role::Ai));
        assert_eq!(result.vote_counts[&ai], 3);
        assert_eq!(result.vote_counts["h1"], 1);
        let room = fx.store.room(room_id).unwrap();
        assert!(room.player(&ai).unwrap().is_eliminated);
        assert_eq!(room.status, RoomStatus::Finished);
        assert_eq!(room.round_phase, RoundPhase::GameEnded);
        assert_eq!(room.winner, Some(Winner::Humans));

        let records = fx.archive.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].winner, Winner::Humans);
        assert_eq!(records[0].votes.len(), 4);
    }

    #[tokio::test]
    async fn test_final_round_tie_ends_the_game_for_ai() {
        // Arrange: round 2 ties as well, so all four humans reach round 3.
        let fx = Fixture::new();
        let room_id = fx.voting_room(&["h1", "h2", "h3", "h4"], 1).await;
        for (voter, target) in [("h1", "h2"), ("h2", "h1"), ("h3", "h4"), ("h4", "h3")] {
            handle_submit_vote(&fx.vote_command(room_id, voter, target), &fx.ctx)
                .await
                .unwrap();
        }
        fx.answer_and_reveal(room_id).await;

        // Act: round 3 splits 2-2 between h1 and h2.
        let mut receipts = Vec::new();
        for (voter, target) in [("h1", "h2"), ("h2", "h1"), ("h3", "h2"), ("h4", "h1")] {
            receipts.push(
                handle_submit_vote(&fx.vote_command(room_id, voter, target), &fx.ctx)
                    .await
                    .unwrap(),
            );
        }

        // Assert
        let result = receipts.pop().unwrap().tally.unwrap();
        assert!(receipts.iter().all(|r| r.tally.is_none()));
        assert_eq!(result.round, 3);
        assert_eq!(result.eliminated_player_id, None);
        assert_eq!(result.summary, "Votes tied. No one was eliminated.");
        assert_eq!(result.end_condition, Some(EndCondition::MaxRoundsReached));
        let room = fx.store.room(room_id).unwrap();
        assert_eq!(room.status, RoomStatus::Finished);
        assert_eq!(room.round_phase, RoundPhase::GameEnded);
        assert_eq!(room.winner, Some(Winner::Ai));
        assert_eq!(room.active_humans().count(), 4);
        assert_eq!(fx.archive.records().len(), 1);
        assert_eq!(fx.archive.records()[0].votes.len(), 8);
    }

    #[tokio::test]
    async fn test_tally_votes_before_deadline_is_not_expired() {
        let fx = Fixture::new();
        let room_id = fx.voting_room(&["host", "b", "c"], 1).await;

        let result = handle_tally_votes(&fx.tally_votes_command(room_id, "host"), &fx.ctx).await;

        assert!(matches!(result, Err(GameError::PhaseNotExpired)));
    }

    #[tokio::test]
    async fn test_expired_tally_counts_only_cast_votes_and_is_idempotent() {
        // Arrange
        let fx = Fixture::new();
        let room_id = fx.voting_room(&["host", "b", "c"], 1).await;
        handle_submit_vote(&fx.vote_command(room_id, "host", "b"), &fx.ctx)
            .await
            .unwrap();
        fx.clock.advance(Duration::seconds(61));

        // Act
        let first = handle_tally_votes(&fx.tally_votes_command(room_id, "c"), &fx.ctx)
            .await
            .unwrap();
        let snapshot = fx.store.room(room_id).unwrap();
        let calls = fx.generator.calls().len();
        let second = handle_tally_votes(&fx.tally_votes_command(room_id, "c"), &fx.ctx)
            .await
            .unwrap();

        // Assert
        let PhaseAdvance::Advanced { round, phase, result: Some(result) } = first else {
            panic!("expected a tally, got {first:?}");
        };
        assert_eq!(round, 3);
        assert_eq!(phase, RoundPhase::AnswerSubmission);
        assert_eq!(result.total_votes, 1);
        assert_eq!(result.eliminated_player_id.as_deref(), Some("b"));
        assert_eq!(second, PhaseAdvance::Unchanged);
        assert_eq!(fx.store.room(room_id).unwrap(), snapshot);
        assert_eq!(fx.generator.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_eliminated_player_cannot_vote_next_round() {
        let fx = Fixture::new();
        let room_id = fx.voting_room(&["h1", "h2", "h3"], 1).await;
        let ai = fx.ai_uids(room_id)[0].clone();
        for (voter, target) in [("h1", "h3"), ("h2", "h3"), ("h3", ai.as_str())] {
            handle_submit_vote(&fx.vote_command(room_id, voter, target), &fx.ctx)
                .await
                .unwrap();
        }
        fx.answer_and_reveal(room_id).await;

        let result = handle_submit_vote(&fx.vote_command(room_id, "h3", "h1"), &fx.ctx).await;
        let at_eliminated =
            handle_submit_vote(&fx.vote_command(room_id, "h1", "h3"), &fx.ctx).await;

        assert!(matches!(result, Err(GameError::Forbidden(_))));
        assert!(matches!(at_eliminated, Err(GameError::InvalidTarget(_))));
    }

    #[tokio::test]
    async fn test_archive_failure_does_not_fail_the_vote() {
        let fx = Fixture::new().with_archive(Arc::new(FailingArchiveSink));
        let room_id = fx.voting_room(&["h1", "h2"], 1).await;
        let ai = fx.ai_uids(room_id)[0].clone();
        handle_submit_vote(&fx.vote_command(room_id, "h1", &ai), &fx.ctx)
            .await
            .unwrap();

        let receipt = handle_submit_vote(&fx.vote_command(room_id, "h2", &ai), &fx.ctx)
            .await
            .unwrap();

        assert!(receipt.tally.unwrap().game_ended);
        assert_eq!(
            fx.store.room(room_id).unwrap().status,
            RoomStatus::Finished
        );
    }

    #[tokio::test]
    async fn test_vote_survives_lost_writes() {
        // Arrange
        let fx = Fixture::new();
        let room_id = fx.voting_room(&["host", "b", "c"], 1).await;
        let room = fx.store.room(room_id).unwrap();
        let store = Arc::new(ConflictingRoomStore::new(InMemoryRoomStore::with_room(room), 3));
        let ctx = context_with_store(&fx, store.clone());

        // Act
        let receipt = handle_submit_vote(&fx.vote_command(room_id, "host", "b"), &ctx)
            .await
            .unwrap();

        // Assert
        assert_eq!(receipt.round, 2);
        let stored = store.load_room(room_id).await.unwrap().unwrap();
        assert_eq!(stored.room.votes.len(), 1);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_vote_gives_up_with_conflict_when_writes_keep_losing() {
        let fx = Fixture::new();
        let room_id = fx.voting_room(&["host", "b", "c"], 1).await;
        let room = fx.store.room(room_id).unwrap();
        let store = Arc::new(ConflictingRoomStore::new(
            InMemoryRoomStore::with_room(room),
            u32::MAX,
        ));
        let ctx = context_with_store(&fx, store);

        let result = handle_submit_vote(&fx.vote_command(room_id, "host", "b"), &ctx).await;

        match result {
            Err(GameError::Conflict { room_id: id, attempts }) => {
                assert_eq!(id, room_id);
                assert_eq!(attempts, ctx.settings.retry.max_attempts);
            }
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_last_votes_tally_exactly_once() {
        // Arrange
        let fx = Fixture::new();
        let humans = ["h1", "h2", "h3", "h4"];
        let room_id = fx.voting_room(&humans, 1).await;
        let calls_before = fx.generator.calls().len();

        // Act: every human votes at once, each for the next one, so the
        // round ties and the game continues.
        let mut tasks = Vec::new();
        for (i, voter) in humans.iter().enumerate() {
            let ctx = fx.ctx.clone();
            let command = fx.vote_command(room_id, voter, humans[(i + 1) % humans.len()]);
            tasks.push(tokio::spawn(async move {
                handle_submit_vote(&command, &ctx).await
            }));
        }
        let mut receipts = Vec::new();
        for task in tasks {
            receipts.push(task.await.unwrap().unwrap());
        }

        // Assert
        let tallies: Vec<&RoundResult> = receipts.iter().filter_map(|r| r.tally.as_ref()).collect();
        assert_eq!(tallies.len(), 1);
        assert_eq!(tallies[0].total_votes, 4);
        assert_eq!(tallies[0].eliminated_player_id, None);

        let room = fx.store.room(room_id).unwrap();
        assert_eq!(room.current_round, 3);
        assert_eq!(room.rounds.len(), 3);
        assert_eq!(room.vote_history.len(), 4);
        let round_three_calls = fx.generator.calls()[calls_before..]
            .iter()
            .filter(|c| c.round_number == 3)
            .count();
        assert_eq!(round_three_calls, 1);
    }
}

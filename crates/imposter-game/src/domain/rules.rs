//! The rules engine: pure decisions and pure room transitions.
//!
//! Every function here either computes a decision from its inputs or applies
//! a transition to a `Room` value that the caller later commits. Time and
//! randomness are passed in.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use imposter_core::error::GameError;
use imposter_core::model::{
    EndCondition, Player, RevealedAnswer, Role, Room, RoomStatus, Round, RoundPhase, RoundResult,
    Vote, Winner,
};
use imposter_core::rng::{DeterministicRng, shuffle};
use imposter_core::store::StagedAnswer;
use uuid::Uuid;

use super::nicknames::generate_unique_nicknames;
use super::questions::next_question;
use crate::settings::GameSettings;

/// Result of counting one round's votes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    /// Votes per target uid.
    pub vote_counts: BTreeMap<String, u32>,
    /// The single target with the most votes, if there is exactly one.
    pub eliminated: Option<String>,
}

/// Outcome of the win condition check after a tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinOutcome {
    /// Play another round.
    Continue,
    /// No impostor is left: humans win.
    AllImpostorsEliminated,
    /// The final round passed with an impostor alive: AI wins.
    MaxRoundsReached,
}

impl WinOutcome {
    /// Winner and end condition, if the game is over.
    #[must_use]
    pub fn conclusion(self) -> Option<(Winner, EndCondition)> {
        match self {
            Self::Continue => None,
            Self::AllImpostorsEliminated => {
                Some((Winner::Humans, EndCondition::AllImpostorsEliminated))
            }
            Self::MaxRoundsReached => Some((Winner::Ai, EndCondition::MaxRoundsReached)),
        }
    }
}

/// Where a room goes once a round's answers are revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterReveal {
    /// Straight into the next answer round (round 1 is never voted on).
    NextRound,
    /// Into the voting window.
    Voting,
}

/// Counts `votes`. A unique maximum is eliminated; a shared maximum, or no
/// vote at all, eliminates nobody.
#[must_use]
pub fn tally(votes: &[Vote]) -> Tally {
    let mut vote_counts: BTreeMap<String, u32> = BTreeMap::new();
    for vote in votes {
        *vote_counts.entry(vote.target_id.clone()).or_default() += 1;
    }

    let max = vote_counts.values().copied().max().unwrap_or(0);
    let mut leaders = vote_counts.iter().filter(|(_, count)| **count == max);
    let eliminated = match (leaders.next(), leaders.next()) {
        (Some((target, _)), None) => Some(target.clone()),
        _ => None,
    };

    Tally {
        vote_counts,
        eliminated,
    }
}

/// Decides whether the game is over after the tally of `current_round`.
///
/// Total: every combination of players and round maps to exactly one
/// outcome. Losing the last impostor wins for the humans even in the final
/// round.
#[must_use]
pub fn evaluate_win(players: &[Player], current_round: u32, max_rounds: u32) -> WinOutcome {
    let impostor_active = players.iter().any(|p| p.is_impostor && p.is_active());
    if !impostor_active {
        WinOutcome::AllImpostorsEliminated
    } else if current_round >= max_rounds {
        WinOutcome::MaxRoundsReached
    } else {
        WinOutcome::Continue
    }
}

/// Round 1 is an unbiased baseline and is never voted on.
#[must_use]
pub fn after_reveal(current_round: u32) -> AfterReveal {
    if current_round <= 1 {
        AfterReveal::NextRound
    } else {
        AfterReveal::Voting
    }
}

/// Whether every active seat has staged an answer this round.
#[must_use]
pub fn all_answers_in(room: &Room) -> bool {
    room.current_round_entry()
        .is_some_and(|round| room.active_players().all(|p| round.has_answered(&p.uid)))
}

/// Whether every active human has voted this round. AI seats never vote.
#[must_use]
pub fn all_votes_in(room: &Room) -> bool {
    room.active_humans().all(|p| {
        room.votes
            .iter()
            .any(|v| v.voter_id == p.uid && v.round == room.current_round)
    })
}

/// Seats the AI players among `humans`, shuffles the table, then names every
/// seat and draws its public seat id in one go.
///
/// # Errors
///
/// Returns `GameError::InvalidState` if the table is too large to name.
pub fn seat_players(
    humans: &[Player],
    impostor_count: usize,
    rng: &mut dyn DeterministicRng,
) -> Result<Vec<Player>, GameError> {
    let mut seats: Vec<Player> = humans
        .iter()
        .map(|p| Player {
            is_impostor: false,
            ..p.clone()
        })
        .collect();
    seats.extend((0..impostor_count).map(|_| Player::ai()));
    shuffle(rng, &mut seats);

    let nicknames = generate_unique_nicknames(seats.len(), rng)?;
    for (seat, nickname) in seats.iter_mut().zip(nicknames) {
        seat.display_name = Some(nickname);
        seat.seat_id = Some(Uuid::new_v4());
    }
    Ok(seats)
}

/// Opens the next answer round with a fresh question.
pub fn open_answer_round(
    room: &mut Room,
    now: DateTime<Utc>,
    window: Duration,
    rng: &mut dyn DeterministicRng,
) {
    let question = next_question(room.language, &room.rounds, rng);
    room.current_round += 1;
    room.rounds.push(Round::new(room.current_round, question));
    room.round_phase = RoundPhase::AnswerSubmission;
    room.round_start_time = Some(now);
    room.round_end_time = Some(now + window);
}

/// Starts a waiting room: seats and names everyone, then opens round 1.
///
/// # Errors
///
/// Returns `GameError::InvalidState` if seating fails.
pub fn start_game(
    room: &mut Room,
    now: DateTime<Utc>,
    settings: &GameSettings,
    rng: &mut dyn DeterministicRng,
) -> Result<(), GameError> {
    room.players = seat_players(&room.players, room.impostor_count, rng)?;
    room.status = RoomStatus::InProgress;
    open_answer_round(room, now, settings.answer_window, rng);
    Ok(())
}

/// Copies the current round's accepted staged answers into its public
/// record, in submission order. Returns the uids that were marked as answered but had
/// no staged text.
pub fn reveal_answers(room: &mut Room, staged: &[StagedAnswer]) -> Vec<String> {
    let round_number = room.current_round;
    let names: BTreeMap<String, Option<String>> = room
        .players
        .iter()
        .map(|p| (p.uid.clone(), p.display_name.clone()))
        .collect();

    let Some(round) = room.current_round_entry_mut() else {
        return Vec::new();
    };

    let mut missing = Vec::new();
    let mut revealed = Vec::with_capacity(round.answered_by.len());
    for author in &round.answered_by {
        let accepted = round.submissions.get(author);
        match staged.iter().find(|s| {
            s.author_id == *author
                && s.round_number == round_number
                && accepted.is_none_or(|id| s.submission_id == *id)
        }) {
            Some(answer) => revealed.push(RevealedAnswer {
                player_id: author.clone(),
                display_name: names.get(author).cloned().flatten(),
                text: answer.text.clone(),
                submitted_at: answer.submitted_at,
            }),
            None => missing.push(author.clone()),
        }
    }
    round.revealed_answers = revealed;
    missing
}

/// Reveals the current round and moves the room on: round 1 goes straight
/// to round 2, later rounds go to voting.
pub fn close_answer_phase(
    room: &mut Room,
    staged: &[StagedAnswer],
    now: DateTime<Utc>,
    settings: &GameSettings,
    rng: &mut dyn DeterministicRng,
) -> Vec<String> {
    let missing = reveal_answers(room, staged);
    match after_reveal(room.current_round) {
        AfterReveal::NextRound => open_answer_round(room, now, settings.answer_window, rng),
        AfterReveal::Voting => {
            room.round_phase = RoundPhase::Voting;
            room.round_start_time = Some(now);
            room.round_end_time = Some(now + settings.vote_window);
        }
    }
    missing
}

fn summarize(total_votes: usize, eliminated: Option<(&str, Role)>) -> String {
    match eliminated {
        Some((name, Role::Ai)) => format!("{name} was eliminated (AI)."),
        Some((name, Role::Human)) => format!("{name} was eliminated (Human)."),
        None if total_votes == 0 => "No votes were cast this round.".to_owned(),
        None => "Votes tied. No one was eliminated.".to_owned(),
    }
}

/// Tallies the current round, applies the elimination, records the round
/// result and either ends the game or opens the next answer round.
pub fn conclude_voting(
    room: &mut Room,
    now: DateTime<Utc>,
    settings: &GameSettings,
    rng: &mut dyn DeterministicRng,
) -> RoundResult {
    let round = room.current_round;
    let round_votes: Vec<Vote> = room
        .votes
        .iter()
        .filter(|v| v.round == round)
        .cloned()
        .collect();
    let Tally {
        vote_counts,
        eliminated,
    } = tally(&round_votes);

    let mut eliminated_seat: Option<(String, Option<String>, Role)> = None;
    if let Some(target) = eliminated {
        if let Some(player) = room.player_mut(&target) {
            player.is_eliminated = true;
            player.eliminated_in_round = Some(round);
            let role = if player.is_impostor { Role::Ai } else { Role::Human };
            eliminated_seat = Some((player.uid.clone(), player.display_name.clone(), role));
        }
    }

    let outcome = evaluate_win(&room.players, round, settings.max_rounds);
    let summary = summarize(
        round_votes.len(),
        eliminated_seat
            .as_ref()
            .map(|(uid, name, role)| (name.as_deref().unwrap_or(uid), *role)),
    );
    let conclusion = outcome.conclusion();

    let result = RoundResult {
        round,
        total_votes: round_votes.len(),
        vote_counts,
        eliminated_player_id: eliminated_seat.as_ref().map(|(uid, _, _)| uid.clone()),
        eliminated_player_name: eliminated_seat.as_ref().and_then(|(_, name, _)| name.clone()),
        eliminated_role: eliminated_seat.as_ref().map(|(_, _, role)| *role),
        summary,
        game_ended: conclusion.is_some(),
        end_condition: conclusion.map(|(_, condition)| condition),
    };
    room.last_round_result = Some(result.clone());

    match conclusion {
        Some((winner, _)) => {
            room.status = RoomStatus::Finished;
            room.round_phase = RoundPhase::GameEnded;
            room.winner = Some(winner);
            room.round_end_time = None;
        }
        None => {
            let closed = std::mem::take(&mut room.votes);
            room.vote_history.extend(closed);
            open_answer_round(room, now, settings.answer_window, rng);
        }
    }

    result
}

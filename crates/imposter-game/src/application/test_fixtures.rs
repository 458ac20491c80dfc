//! Shared setup for handler tests: an in-memory context plus helpers that
//! drive a room to the phase a test needs.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use imposter_core::archive::ArchiveSink;
use imposter_core::generator::AnswerGenerator;
use imposter_core::model::{Language, Player, Privacy, Room, RoundPhase};
use imposter_core::rng::DeterministicRng;
use imposter_core::store::RoomStore;
use imposter_test_support::{
    InMemoryRoomStore, ManualClock, MockRng, RecordingAnswerGenerator, RecordingArchiveSink,
};
use uuid::Uuid;

use crate::application::answers::{handle_submit_answer, handle_tally_answers};
use crate::application::context::GameContext;
use crate::application::lifecycle::handle_start_room;
use crate::domain::commands::{
    CreateRoom, JoinRoom, StartRoom, SubmitAnswer, SubmitVote, TallyAnswers, TallyVotes,
};
use crate::settings::{AiDispatch, GameSettings, RetryPolicy};

pub(crate) struct Fixture {
    pub now: DateTime<Utc>,
    pub clock: Arc<ManualClock>,
    pub store: Arc<InMemoryRoomStore>,
    pub generator: Arc<RecordingAnswerGenerator>,
    pub archive: Arc<RecordingArchiveSink>,
    pub ctx: GameContext,
}

pub(crate) fn create_command(host_id: &str, impostor_count: usize) -> CreateRoom {
    CreateRoom {
        correlation_id: Uuid::new_v4(),
        host_id: host_id.to_owned(),
        language: Language::En,
        impostor_count,
        privacy: Privacy::Public,
        ai_model_id: None,
    }
}

/// The fixture's context with a different store.
pub(crate) fn context_with_store(fx: &Fixture, store: Arc<dyn RoomStore>) -> GameContext {
    GameContext {
        store,
        ..fx.ctx.clone()
    }
}

impl Fixture {
    pub fn new() -> Self {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(now));
        let store = Arc::new(InMemoryRoomStore::new());
        let generator = Arc::new(RecordingAnswerGenerator::new("Probably pizza, honestly."));
        let archive = Arc::new(RecordingArchiveSink::new());
        let rng: Arc<Mutex<dyn DeterministicRng>> = Arc::new(Mutex::new(MockRng));
        let settings = GameSettings {
            retry: RetryPolicy {
                max_attempts: 8,
                backoff: std::time::Duration::from_millis(1),
            },
            ai_dispatch: AiDispatch::Inline,
            ..GameSettings::default()
        };
        let ctx = GameContext {
            store: store.clone(),
            clock: clock.clone(),
            rng,
            generator: generator.clone(),
            archive: archive.clone(),
            settings: Arc::new(settings),
        };
        Self {
            now,
            clock,
            store,
            generator,
            archive,
            ctx,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.ctx.generator = generator;
        self
    }

    pub fn with_archive(mut self, archive: Arc<dyn ArchiveSink>) -> Self {
        self.ctx.archive = archive;
        self
    }

    pub fn background(mut self) -> Self {
        let settings = GameSettings {
            ai_dispatch: AiDispatch::Background,
            ..(*self.ctx.settings).clone()
        };
        self.ctx.settings = Arc::new(settings);
        self
    }

    /// Inserts a waiting room hosted by `uids[0]` with every uid seated.
    pub async fn waiting_room(&self, uids: &[&str], impostors: usize) -> Uuid {
        let mut room = Room::new(
            Uuid::new_v4(),
            uids[0],
            Language::En,
            Privacy::Public,
            impostors,
            "gpt-5",
            self.now,
        );
        room.players = uids.iter().map(|uid| Player::human(*uid)).collect();
        self.store.insert_room(&room).await.unwrap();
        room.id
    }

    /// A room in the answer phase of round 1, AI answers already staged.
    pub async fn started_room(&self, uids: &[&str], impostors: usize) -> Uuid {
        let room_id = self.waiting_room(uids, impostors).await;
        handle_start_room(&self.start_command(room_id, uids[0]), &self.ctx)
            .await
            .unwrap();
        room_id
    }

    /// A room in the voting phase of round 2.
    pub async fn voting_room(&self, uids: &[&str], impostors: usize) -> Uuid {
        let room_id = self.started_room(uids, impostors).await;
        self.answer_and_reveal(room_id).await;
        self.answer_and_reveal(room_id).await;
        let room = self.store.room(room_id).unwrap();
        assert_eq!(room.current_round, 2);
        assert_eq!(room.round_phase, RoundPhase::Voting);
        room_id
    }

    /// Every active human answers, then the answer phase is tallied. From
    /// round 2 on this lands in the voting phase.
    pub async fn answer_and_reveal(&self, room_id: Uuid) {
        self.answer_all_humans(room_id).await;
        let host = self.store.room(room_id).unwrap().host_id;
        handle_tally_answers(&self.tally_answers_command(room_id, &host), &self.ctx)
            .await
            .unwrap();
    }

    pub async fn answer_all_humans(&self, room_id: Uuid) {
        let room = self.store.room(room_id).unwrap();
        for player in room.active_humans() {
            let text = format!("answer from {}", player.uid);
            handle_submit_answer(&self.answer_command(room_id, &player.uid, &text), &self.ctx)
                .await
                .unwrap();
        }
    }

    pub fn ai_uids(&self, room_id: Uuid) -> Vec<String> {
        self.store
            .room(room_id)
            .unwrap()
            .ai_players()
            .map(|p| p.uid.clone())
            .collect()
    }

    pub fn join_command(&self, room_id: Uuid, player_id: &str) -> JoinRoom {
        JoinRoom {
            correlation_id: Uuid::new_v4(),
            room_id,
            player_id: player_id.to_owned(),
        }
    }

    pub fn start_command(&self, room_id: Uuid, caller_id: &str) -> StartRoom {
        StartRoom {
            correlation_id: Uuid::new_v4(),
            room_id,
            caller_id: caller_id.to_owned(),
        }
    }

    pub fn answer_command(&self, room_id: Uuid, player_id: &str, text: &str) -> SubmitAnswer {
        SubmitAnswer {
            correlation_id: Uuid::new_v4(),
            room_id,
            player_id: player_id.to_owned(),
            text: text.to_owned(),
        }
    }

    pub fn tally_answers_command(&self, room_id: Uuid, caller_id: &str) -> TallyAnswers {
        TallyAnswers {
            correlation_id: Uuid::new_v4(),
            room_id,
            caller_id: caller_id.to_owned(),
        }
    }

    pub fn vote_command(&self, room_id: Uuid, voter_id: &str, target_id: &str) -> SubmitVote {
        SubmitVote {
            correlation_id: Uuid::new_v4(),
            room_id,
            voter_id: voter_id.to_owned(),
            target_id: target_id.to_owned(),
        }
    }

    pub fn tally_votes_command(&self, room_id: Uuid, caller_id: &str) -> TallyVotes {
        TallyVotes {
            correlation_id: Uuid::new_v4(),
            room_id,
            caller_id: caller_id.to_owned(),
        }
    }
}

//! Dependencies shared by every handler.

use std::sync::{Arc, Mutex};

use imposter_core::archive::ArchiveSink;
use imposter_core::clock::Clock;
use imposter_core::error::GameError;
use imposter_core::generator::AnswerGenerator;
use imposter_core::rng::DeterministicRng;
use imposter_core::store::RoomStore;

use crate::settings::GameSettings;

/// Everything a handler needs, cheap to clone into background tasks.
#[derive(Clone)]
pub struct GameContext {
    /// Room document and staging log.
    pub store: Arc<dyn RoomStore>,
    /// Source of "now" for deadlines and timestamps.
    pub clock: Arc<dyn Clock>,
    /// Randomness for seating, nicknames and questions.
    pub rng: Arc<Mutex<dyn DeterministicRng>>,
    /// Writes the impostors' answers.
    pub generator: Arc<dyn AnswerGenerator>,
    /// Receives finished games.
    pub archive: Arc<dyn ArchiveSink>,
    /// Game rules and engine knobs.
    pub settings: Arc<GameSettings>,
}

impl std::fmt::Debug for GameContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl GameContext {
    /// Runs `f` with exclusive access to the RNG.
    ///
    /// The lock is released before this returns, so callers must not hold
    /// on to anything derived from it across an `.await`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Infrastructure` if the RNG mutex is poisoned, or
    /// whatever `f` returns.
    pub fn with_rng<T>(
        &self,
        f: impl FnOnce(&mut dyn DeterministicRng) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| GameError::Infrastructure(format!("rng lock poisoned: {e}")))?;
        f(&mut *rng)
    }
}

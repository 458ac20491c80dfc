//! Shared application state.

use imposter_game::application::context::GameContext;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Collaborators and settings every game command runs against.
    pub game: GameContext,
    /// Upper bound on `GET /rooms?limit=`.
    pub max_listing: usize,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(game: GameContext) -> Self {
        Self {
            game,
            max_listing: 50,
        }
    }
}

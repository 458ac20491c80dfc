//! AI models a room can be created with.

use axum::{Json, Router, routing::get};
use imposter_game::domain::models::{self, ModelInfo};

use crate::state::AppState;

async fn list_models() -> Json<&'static [ModelInfo]> {
    Json(models::list_models())
}

/// Returns the router for the model catalog.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_models))
}

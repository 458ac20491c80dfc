//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use imposter_core::clock::Clock;
use imposter_core::rng::DeterministicRng;
use imposter_game::application::context::GameContext;
use imposter_game::settings::{AiDispatch, GameSettings};
use imposter_test_support::{
    FixedClock, InMemoryRoomStore, MockRng, RecordingAnswerGenerator, RecordingArchiveSink,
};
use tower::ServiceExt;
use uuid::Uuid;

use imposter_api::routes;
use imposter_api::routes::rooms::PLAYER_ID_HEADER;
use imposter_api::state::AppState;

/// The app plus handles on the fakes behind it.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryRoomStore>,
    pub generator: Arc<RecordingAnswerGenerator>,
    pub archive: Arc<RecordingArchiveSink>,
}

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Build the full app router over an in-memory store with deterministic
/// clock and RNG. AI turns and archival run inline so every response
/// reflects them. Uses the same route structure as `main.rs`.
pub fn build_test_app() -> TestApp {
    let store = Arc::new(InMemoryRoomStore::new());
    let generator = Arc::new(RecordingAnswerGenerator::new("Cereal, like always."));
    let archive = Arc::new(RecordingArchiveSink::new());
    let rng: Arc<Mutex<dyn DeterministicRng>> = Arc::new(Mutex::new(MockRng));
    let game = GameContext {
        store: store.clone(),
        clock: fixed_clock(),
        rng,
        generator: generator.clone(),
        archive: archive.clone(),
        settings: Arc::new(GameSettings {
            ai_dispatch: AiDispatch::Inline,
            ..GameSettings::default()
        }),
    };

    let router = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/models", routes::models::router())
        .nest("/api/v1/rooms", routes::rooms::router())
        .with_state(AppState::new(game));

    TestApp {
        router,
        store,
        generator,
        archive,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a POST request as `caller` with a JSON body and return the response.
pub async fn post_json(
    app: &Router,
    uri: &str,
    caller: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(PLAYER_ID_HEADER, caller)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a POST request as `caller` without a body.
pub async fn post_empty(app: &Router, uri: &str, caller: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(PLAYER_ID_HEADER, caller)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request as `caller` and return the response.
pub async fn get_json_as(app: &Router, uri: &str, caller: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header(PLAYER_ID_HEADER, caller)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Creates a one-impostor room hosted by `uids[0]`, seats the rest and
/// starts it.
pub async fn started_room(app: &Router, uids: &[&str]) -> Uuid {
    let (status, json) = post_json(
        app,
        "/api/v1/rooms",
        uids[0],
        &serde_json::json!({ "language": "en", "impostor_count": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let room_id: Uuid = json["room_id"].as_str().unwrap().parse().unwrap();

    for uid in &uids[1..] {
        let (status, _) = post_empty(app, &format!("/api/v1/rooms/{room_id}/join"), uid).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (status, _) = post_empty(app, &format!("/api/v1/rooms/{room_id}/start"), uids[0]).await;
    assert_eq!(status, StatusCode::OK);
    room_id
}

/// Every uid answers, then the host tallies the answer phase.
pub async fn answer_round(app: &Router, room_id: Uuid, uids: &[&str]) -> serde_json::Value {
    for uid in uids {
        let (status, _) = post_json(
            app,
            &format!("/api/v1/rooms/{room_id}/answers"),
            uid,
            &serde_json::json!({ "text": format!("{uid} says hi") }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, json) =
        post_empty(app, &format!("/api/v1/rooms/{room_id}/answers/tally"), uids[0]).await;
    assert_eq!(status, StatusCode::OK);
    json
}

/// Public seat id of `uid`, read from the store behind the API.
pub fn seat_of(app: &TestApp, room_id: Uuid, uid: &str) -> String {
    app.store
        .room(room_id)
        .unwrap()
        .player(uid)
        .and_then(|p| p.seat_id)
        .unwrap()
        .to_string()
}

/// Public seat id of the room's AI seat, read from the store behind the API.
pub fn ai_seat(app: &TestApp, room_id: Uuid) -> String {
    app.store
        .room(room_id)
        .unwrap()
        .ai_players()
        .find_map(|p| p.seat_id)
        .unwrap()
        .to_string()
}

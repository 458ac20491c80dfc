//! Imposter API server entry point.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use imposter_api::config::Config;
use imposter_api::error::AppError;
use imposter_api::generator::{HttpAnswerGenerator, OfflineAnswerGenerator};
use imposter_api::routes;
use imposter_api::state::AppState;
use imposter_api::telemetry;
use imposter_core::clock::SystemClock;
use imposter_core::generator::AnswerGenerator;
use imposter_core::rng::{DeterministicRng, SystemRng};
use imposter_game::application::context::GameContext;
use imposter_store::pg_archive_sink::PgArchiveSink;
use imposter_store::pg_room_store::PgRoomStore;
use imposter_store::schema::MIGRATOR;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const GENERATOR_TIMEOUT: Duration = Duration::from_secs(20);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting Imposter API server");

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    MIGRATOR.run(&pool).await?;

    let generator: Arc<dyn AnswerGenerator> = match &config.answer_generator_url {
        Some(url) => Arc::new(HttpAnswerGenerator::new(url.clone(), GENERATOR_TIMEOUT)?),
        None => {
            tracing::warn!("ANSWER_GENERATOR_URL not set; AI seats will use fallback answers");
            Arc::new(OfflineAnswerGenerator)
        }
    };
    let rng: Arc<Mutex<dyn DeterministicRng>> = Arc::new(Mutex::new(SystemRng::new()));

    let game = GameContext {
        store: Arc::new(PgRoomStore::new(pool.clone())),
        clock: Arc::new(SystemClock),
        rng,
        generator,
        archive: Arc::new(PgArchiveSink::new(pool)),
        settings: Arc::new(config.settings.clone()),
    };

    // TODO: Replace CorsLayer::permissive() with the game client's origin.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/models", routes::models::router())
        .nest("/api/v1/rooms", routes::rooms::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(game));

    tracing::info!("Listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    axum::serve(listener, app).await?;

    telemetry.shutdown();
    Ok(())
}

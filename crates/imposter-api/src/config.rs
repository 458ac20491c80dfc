//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;

use imposter_game::domain::models;
use imposter_game::settings::{AiDispatch, GameSettings, RetryPolicy};

use crate::error::AppError;

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string.
    pub database_url: String,
    /// Address the HTTP server binds to.
    pub addr: SocketAddr,
    /// Answer generator endpoint; AI seats fall back to canned answers
    /// when unset.
    pub answer_generator_url: Option<String>,
    /// OTLP collector endpoint; traces are only exported when set.
    pub otlp_endpoint: Option<String>,
    /// Game rules and engine knobs.
    pub settings: GameSettings,
}

impl Config {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable if it is set.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| {
            AppError::Config("DATABASE_URL environment variable must be set".to_owned())
        })?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;

        let defaults = GameSettings::default();
        let answer_secs: i64 = parse_or(&lookup, "ANSWER_WINDOW_SECS", 90)?;
        let vote_secs: i64 = parse_or(&lookup, "VOTE_WINDOW_SECS", 60)?;
        let ai_dispatch = match lookup("AI_DISPATCH").as_deref() {
            None | Some("background") => AiDispatch::Background,
            Some("inline") => AiDispatch::Inline,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "AI_DISPATCH must be `background` or `inline`, got `{other}`"
                )));
            }
        };

        let settings = GameSettings {
            answer_window: positive_window("ANSWER_WINDOW_SECS", answer_secs)?,
            vote_window: positive_window("VOTE_WINDOW_SECS", vote_secs)?,
            max_rounds: parse_or(&lookup, "MAX_ROUNDS", defaults.max_rounds)?,
            min_players: parse_or(&lookup, "MIN_PLAYERS", defaults.min_players)?,
            default_model_id: lookup("DEFAULT_AI_MODEL").unwrap_or(defaults.default_model_id),
            retry: RetryPolicy {
                max_attempts: parse_or(&lookup, "TX_MAX_ATTEMPTS", defaults.retry.max_attempts)?,
                ..defaults.retry
            },
            ai_dispatch,
            ..GameSettings::default()
        };

        if settings.max_rounds < 2 {
            return Err(AppError::Config(
                "MAX_ROUNDS must be at least 2 so a voting round exists".to_owned(),
            ));
        }
        if models::find_model(&settings.default_model_id).is_none() {
            return Err(AppError::Config(format!(
                "DEFAULT_AI_MODEL `{}` is not in the model catalog",
                settings.default_model_id
            )));
        }
        if settings.retry.max_attempts == 0 {
            return Err(AppError::Config("TX_MAX_ATTEMPTS must be at least 1".to_owned()));
        }

        Ok(Self {
            database_url,
            addr,
            answer_generator_url: lookup("ANSWER_GENERATOR_URL").filter(|url| !url.is_empty()),
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|url| !url.is_empty()),
            settings,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
    }
}

fn positive_window(key: &str, secs: i64) -> Result<chrono::Duration, AppError> {
    if secs <= 0 {
        return Err(AppError::Config(format!("{key} must be positive")));
    }
    Ok(chrono::Duration::seconds(secs))
}

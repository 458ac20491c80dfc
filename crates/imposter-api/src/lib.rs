//! Imposter: HTTP command surface.

pub mod config;
pub mod error;
pub mod generator;
pub mod routes;
pub mod state;
pub mod telemetry;

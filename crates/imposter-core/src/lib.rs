//! Imposter Core: shared data model and ports.
//!
//! This crate defines the room document, the traits the engine consumes
//! (store, answer generator, archival sink) and the error model. It contains
//! no infrastructure code.

pub mod archive;
pub mod clock;
pub mod command;
pub mod error;
pub mod generator;
pub mod model;
pub mod rng;
pub mod store;

//! Pure game rules. Nothing in here performs I/O.

pub mod commands;
pub mod models;
pub mod nicknames;
pub mod phase_clock;
pub mod questions;
pub mod rules;

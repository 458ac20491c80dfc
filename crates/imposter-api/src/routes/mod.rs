//! Route modules.

pub mod health;
pub mod models;
pub mod rooms;

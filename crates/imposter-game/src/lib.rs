//! Imposter Game: the orchestration engine.
//!
//! Advances a room through its phases, decides who may act and when, stages
//! and reveals answers, and tallies votes. Pure rules live in [`domain`];
//! the store-backed command handlers live in [`application`].

pub mod application;
pub mod domain;
pub mod settings;

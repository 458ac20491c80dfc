//! Store-backed command and query handlers.
//!
//! Each handler loads the room, asks the rules engine for a decision and
//! commits it through an optimistic transaction. Work that talks to slow
//! collaborators (answer generation, archival) runs only after the commit.

pub mod ai_turns;
pub mod answers;
pub mod archival;
pub mod context;
pub mod lifecycle;
pub mod outcomes;
pub mod query_handlers;
pub mod transaction;
pub mod votes;

#[cfg(test)]
pub(crate) mod test_fixtures;

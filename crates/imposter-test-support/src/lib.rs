//! Shared test fakes and utilities for the Imposter game engine.

mod archive;
mod clock;
mod generator;
mod rng;
mod store;

pub use archive::{FailingArchiveSink, RecordingArchiveSink};
pub use clock::{FixedClock, ManualClock};
pub use generator::{FailingAnswerGenerator, RecordingAnswerGenerator};
pub use rng::{MockRng, SequenceRng};
pub use store::{ConflictingRoomStore, FailingRoomStore, InMemoryRoomStore};

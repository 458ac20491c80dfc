//! Test archival sinks.

use std::sync::Mutex;

use async_trait::async_trait;
use imposter_core::archive::{ArchiveSink, GameRecord};
use imposter_core::error::CollaboratorError;

/// Keeps every archived record in memory.
#[derive(Debug, Default)]
pub struct RecordingArchiveSink {
    records: Mutex<Vec<GameRecord>>,
}

impl RecordingArchiveSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every archived record.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn records(&self) -> Vec<GameRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArchiveSink for RecordingArchiveSink {
    async fn archive(&self, record: &GameRecord) -> Result<(), CollaboratorError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// A sink that rejects every record.
#[derive(Debug)]
pub struct FailingArchiveSink;

#[async_trait]
impl ArchiveSink for FailingArchiveSink {
    async fn archive(&self, _record: &GameRecord) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unavailable("archive table is read-only".into()))
    }
}

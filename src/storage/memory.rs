use super::base::{RecordSink, StorageError};
use crate::model::{ListingRecord, RowTag};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<(ListingRecord, RowTag)>,
    flushed: usize,
    flushes: usize,
}

/// Keeps rows in memory. Clones share the same table, so a test can hand one
/// to a session and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<(ListingRecord, RowTag)> {
        self.state.lock().rows.clone()
    }

    /// Rows that were covered by a flush.
    pub fn flushed_rows(&self) -> usize {
        self.state.lock().flushed
    }

    pub fn flushes(&self) -> usize {
        self.state.lock().flushes
    }
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &ListingRecord, tag: RowTag) -> Result<(), StorageError> {
        self.state.lock().rows.push((record.clone(), tag));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        state.flushed = state.rows.len();
        state.flushes += 1;
        Ok(())
    }

    fn row_count(&self) -> usize {
        self.state.lock().rows.len()
    }
}

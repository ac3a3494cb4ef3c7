//! Bounded history of completed tests
//!
//! Most-recent-first ring of up to [`HISTORY_CAPACITY`] snapshots. Reads
//! hand out independent copies so callers cannot reach into the internal
//! storage.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::types::HistoryRecord;

/// Maximum number of completed-test snapshots retained.
pub const HISTORY_CAPACITY: usize = 100;

pub struct HistoryRing {
    records: Mutex<VecDeque<HistoryRecord>>,
}

impl HistoryRing {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(HISTORY_CAPACITY)),
        }
    }

    /// Prepend a record, dropping the oldest once past capacity.
    pub fn push(&self, record: HistoryRecord) {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push_front(record);
        records.truncate(HISTORY_CAPACITY);
    }

    /// All records, newest first.
    pub fn all(&self) -> Vec<HistoryRecord> {
        match self.records.lock() {
            Ok(records) => records.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<HistoryRecord> {
        self.all().into_iter().find(|r| r.id == id)
    }

    /// The intersection with `ids`, in history order rather than input
    /// order.
    pub fn get_many(&self, ids: &[String]) -> Vec<HistoryRecord> {
        self.all()
            .into_iter()
            .filter(|r| ids.iter().any(|id| id == &r.id))
            .collect()
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new()
    }
}

//! Append-only log of failed remote writes, kept for later inspection.
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::error;
use quote_common::RecordId;

/// One failed write.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    /// Record the write targeted.
    pub record_id: RecordId,
    /// Error detail as reported by the transport.
    pub detail: String,
    /// When the failure was observed.
    pub at: DateTime<Utc>,
}

/// Shared, cloneable failure log.
#[derive(Debug, Clone, Default)]
pub struct FailureLog {
    entries: Arc<Mutex<Vec<FailureRecord>>>,
}

impl FailureLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a failure and mirrors it to the error log.
    pub fn record(&self, record_id: RecordId, detail: String) {
        error!("Write for record {} failed: {}", record_id, detail);
        let entry = FailureRecord {
            record_id,
            detail,
            at: Utc::now(),
        };
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(e) => error!("Failure log unavailable: {}", e),
        }
    }

    /// Snapshot of all recorded failures, oldest first.
    pub fn entries(&self) -> Vec<FailureRecord> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// `true` when nothing has failed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

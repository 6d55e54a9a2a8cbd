//! In-memory buffer of pending log records.
//!
//! The buffer is the single shared mutable resource of the shipper: all
//! access goes through its atomic `append`/`drain_and_clear`/`merge`
//! operations. Appends never touch I/O and never suspend.

use parking_lot::Mutex;

use crate::record::LogRecord;

/// Concurrency-safe container of records awaiting delivery.
///
/// `append` is O(1) amortized and safe under unbounded concurrent callers.
/// A drain and a racing append never interleave: the append lands either
/// entirely before or entirely after the drain.
#[derive(Debug, Default)]
pub struct RecordBuffer {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer seeded with previously persisted records, so that
    /// records durable at last process exit retry on the next cycle.
    pub fn seeded(records: Vec<LogRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Add one record to the end of the buffer.
    pub fn append(&self, record: LogRecord) {
        self.records.lock().push(record);
    }

    /// Atomically take every buffered record, in append order, leaving the
    /// buffer empty.
    pub fn drain_and_clear(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    /// Reinsert a previously drained batch ahead of any records appended
    /// since the drain. Used on delivery failure; no record is lost or
    /// duplicated.
    pub fn merge(&self, batch: Vec<LogRecord>) {
        if batch.is_empty() {
            return;
        }
        let mut records = self.records.lock();
        let appended_since = std::mem::replace(&mut *records, batch);
        records.extend(appended_since);
    }

    /// Get the current number of buffered records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

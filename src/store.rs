//! Durable storage for the last undelivered batch.
//!
//! A failed delivery cycle persists its batch here so it survives process
//! restarts; the next successful cycle (or an empty one) clears it. The
//! store holds at most one snapshot at a time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::record::LogRecord;

/// Name of the snapshot file under the storage directory.
pub const STORE_FILENAME: &str = "logs.json";

/// Errors that can occur during durable store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Filesystem operation failed
    Io(io::Error),

    /// Snapshot could not be serialized or deserialized
    Serde(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "Store I/O failed: {}", e),
            StoreError::Serde(e) => write!(f, "Snapshot serialization failed: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Serde(e) => Some(e),
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err)
    }
}

/// Persistence contract for the at-risk batch.
///
/// Each call is atomic from the shipper's perspective: no partial-write
/// state is ever observable through `load`.
pub trait DurableStore: Send + Sync {
    /// Persist the batch, overwriting any existing snapshot.
    fn save(&self, batch: &[LogRecord]) -> Result<(), StoreError>;

    /// Load the persisted snapshot, or `None` if nothing is pending.
    fn load(&self) -> Result<Option<Vec<LogRecord>>, StoreError>;

    /// Delete the snapshot. No-op if absent.
    fn remove(&self) -> Result<(), StoreError>;
}

/// File-backed durable store holding one JSON snapshot file.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-save leaves either the old snapshot or the new one, never a
/// torn file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a file store rooted at the given directory, creating the
    /// directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(STORE_FILENAME),
        })
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DurableStore for FileStore {
    fn save(&self, batch: &[LogRecord]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(batch)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<Vec<LogRecord>>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

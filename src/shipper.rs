//! Delivery cycle orchestration.
//!
//! The [`Shipper`] owns the record buffer, the durable store, and the
//! transport, and runs delivery cycles end-to-end: drain, encode, POST,
//! then clear the snapshot on success or persist-and-requeue on failure.
//! All failures are handled locally; nothing propagates to the caller
//! that triggered the cycle.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::buffer::RecordBuffer;
use crate::config::{AppInfo, ShipperConfig};
use crate::record::{CallSite, LogLevel, LogRecord};
use crate::store::{DurableStore, FileStore, StoreError};
use crate::transport::{HttpTransport, Transport, TransportError, SUCCESS_STATUS};

/// Caller-supplied predicate consulted at the start of each cycle; `false`
/// aborts the cycle with no side effects.
pub type Gate = Box<dyn Fn() -> bool + Send + Sync>;

/// Errors that can occur while constructing a shipper.
#[derive(Debug)]
pub enum ShipperError {
    /// Transport could not be built
    Transport(TransportError),

    /// Durable store could not be opened
    Store(StoreError),
}

impl std::fmt::Display for ShipperError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShipperError::Transport(e) => write!(f, "Failed to build transport: {}", e),
            ShipperError::Store(e) => write!(f, "Failed to open durable store: {}", e),
        }
    }
}

impl std::error::Error for ShipperError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShipperError::Transport(e) => Some(e),
            ShipperError::Store(e) => Some(e),
        }
    }
}

impl From<TransportError> for ShipperError {
    fn from(err: TransportError) -> Self {
        ShipperError::Transport(err)
    }
}

impl From<StoreError> for ShipperError {
    fn from(err: StoreError) -> Self {
        ShipperError::Store(err)
    }
}

/// Store-and-forward log shipper.
///
/// Records appended between cycles accumulate in memory; each cycle drains
/// the buffer, POSTs the batch as a JSON array, and on any failure writes
/// the batch to the durable store and merges it back into the buffer so
/// the next cycle retries it. Construction reloads whatever the store
/// holds, so records stranded by a crash ride along with the next cycle.
///
/// # Example
///
/// ```no_run
/// use logship::{call_site, AppInfo, LogLevel, Shipper, ShipperConfig};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let config = ShipperConfig::new("https://logs.example.com/ingest", "app", "secret");
///     let shipper = Arc::new(Shipper::new(config, AppInfo::default()).unwrap());
///
///     shipper.append(LogLevel::Info, "started", HashMap::new(), call_site!());
///
///     // Fire-and-forget: does not wait for the network
///     shipper.trigger();
/// }
/// ```
pub struct Shipper {
    buffer: RecordBuffer,
    store: Arc<dyn DurableStore>,
    transport: Arc<dyn Transport>,
    app: AppInfo,
    gate: Option<Gate>,

    // Serializes delivery cycles: at most one batch is in flight per
    // shipper instance.
    cycle: tokio::sync::Mutex<()>,
}

impl Shipper {
    /// Create a shipper with the production transport and file store.
    pub fn new(config: ShipperConfig, app: AppInfo) -> Result<Self, ShipperError> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        let store = Arc::new(FileStore::new(&config.storage_dir)?);
        Ok(Self::with_parts(transport, store, app))
    }

    /// Create a shipper over explicit transport and store implementations.
    ///
    /// The buffer is seeded from the store's snapshot; a load error is
    /// logged and the shipper starts empty rather than failing.
    pub fn with_parts(
        transport: Arc<dyn Transport>,
        store: Arc<dyn DurableStore>,
        app: AppInfo,
    ) -> Self {
        let seeded = match store.load() {
            Ok(snapshot) => snapshot.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "Failed to load persisted records, starting empty");
                Vec::new()
            }
        };

        if !seeded.is_empty() {
            debug!(count = seeded.len(), "Restored persisted records");
        }

        Self {
            buffer: RecordBuffer::seeded(seeded),
            store,
            transport,
            app,
            gate: None,
            cycle: tokio::sync::Mutex::new(()),
        }
    }

    /// Install a gating predicate consulted at the start of each cycle.
    pub fn with_gate(mut self, gate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.gate = Some(Box::new(gate));
        self
    }

    /// Append one record to the buffer.
    ///
    /// Never blocks on I/O and never fails; the record is stamped with the
    /// injected environment metadata and the call-site entries. Use the
    /// [`call_site!`](crate::call_site) macro to capture `site`.
    pub fn append(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        extra: HashMap<String, String>,
        site: CallSite,
    ) {
        let record = LogRecord::new(level, message, &self.app, extra, site);
        self.buffer.append(record);
    }

    /// Number of records currently buffered.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Run one delivery cycle to completion.
    ///
    /// Cycles are serialized: a call made while another cycle is in flight
    /// waits for it, then drains only records appended after the earlier
    /// drain. The outcome is handled internally; repeated failures simply
    /// leave the records buffered and persisted for the next cycle.
    pub async fn deliver(&self) {
        let _cycle = self.cycle.lock().await;

        if let Some(gate) = &self.gate {
            if !gate() {
                debug!("Delivery gated off, skipping cycle");
                return;
            }
        }

        let batch = self.buffer.drain_and_clear();
        if batch.is_empty() {
            // Nothing to retry; a snapshot from an earlier failure is
            // obsolete once its records were delivered by a later cycle.
            if let Err(err) = self.store.remove() {
                warn!(error = %err, "Failed to clear stale snapshot");
            }
            return;
        }

        let payload = match serde_json::to_vec(&batch) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, count = batch.len(), "Failed to encode batch, requeueing");
                self.persist_and_requeue(batch);
                return;
            }
        };

        debug!(count = batch.len(), bytes = payload.len(), "Sending batch");

        match self.transport.post(payload).await {
            Ok(SUCCESS_STATUS) => {
                debug!(count = batch.len(), "Batch delivered");
                if let Err(err) = self.store.remove() {
                    warn!(error = %err, "Failed to clear snapshot after delivery");
                }
            }
            Ok(status) => {
                warn!(status, count = batch.len(), "Delivery rejected, requeueing");
                self.persist_and_requeue(batch);
            }
            Err(err) => {
                warn!(error = %err, count = batch.len(), "Delivery failed, requeueing");
                self.persist_and_requeue(batch);
            }
        }
    }

    /// Spawn one delivery cycle on the tokio runtime without waiting for
    /// network completion. Clone the `Arc` to keep a handle.
    pub fn trigger(self: Arc<Self>) {
        tokio::spawn(async move {
            self.deliver().await;
        });
    }

    /// Persist the failed batch (overwriting any prior snapshot) and merge
    /// it back into the buffer for the next cycle. The merge happens even
    /// if persistence fails, so the records survive within the process.
    fn persist_and_requeue(&self, batch: Vec<LogRecord>) {
        if let Err(err) = self.store.save(&batch) {
            warn!(error = %err, "Failed to persist batch, records retained in memory only");
        }
        self.buffer.merge(batch);
    }
}

//! logship — store-and-forward log shipping.
//!
//! Accumulates structured log records in memory, periodically delivers them
//! to a remote collection endpoint over HTTP, and guarantees records are
//! never silently lost across network failures or process restarts:
//!
//! - **record**: the log record data model shared by the wire payload and
//!   the durable snapshot
//! - **buffer**: concurrency-safe in-memory buffer of pending records
//! - **store**: disk-backed durability for the last undelivered batch
//! - **transport**: authenticated HTTP POST of an encoded batch
//! - **shipper**: delivery cycle orchestration (drain, send, retry/merge)
//! - **layer**: `tracing` adapter forwarding events into the shipper
//! - **config**: endpoint, credentials, storage, and environment metadata
//!
//! # Example
//!
//! ```no_run
//! use logship::{call_site, AppInfo, Environment, LogLevel, Shipper, ShipperConfig};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ShipperConfig::new("https://logs.example.com/ingest", "app", "secret");
//!     let app = AppInfo::new(Environment::Production, "17.0", "server-01", "2.1.0", "340");
//!
//!     // Construction reloads any batch persisted by a previous run
//!     let shipper = Arc::new(Shipper::new(config, app).unwrap());
//!
//!     shipper.append(LogLevel::Info, "service started", HashMap::new(), call_site!());
//!
//!     // Trigger a delivery cycle on whatever cadence fits the host app;
//!     // the call returns immediately and failures are retried next cycle.
//!     shipper.trigger();
//! }
//! ```

// Module declarations
pub mod buffer;
pub mod config;
pub mod layer;
pub mod record;
pub mod shipper;
pub mod store;
pub mod transport;

// Re-export commonly used types at crate root for convenience
pub use buffer::RecordBuffer;
pub use config::{AppInfo, ConfigError, ShipperConfig};
pub use layer::ShipperLayer;
pub use record::{CallSite, Environment, LogLevel, LogRecord};
pub use shipper::{Gate, Shipper, ShipperError};
pub use store::{DurableStore, FileStore, StoreError, STORE_FILENAME};
pub use transport::{HttpTransport, Transport, TransportError, SUCCESS_STATUS};

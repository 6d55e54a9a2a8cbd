//! `tracing` adapter for the shipper.
//!
//! [`ShipperLayer`] forwards every `tracing` event into a shared
//! [`Shipper`], so a host that already logs through the `tracing` facade
//! ships records without calling the direct API. Event fields become the
//! record's `data` map and the event's metadata supplies the call site.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::record::{CallSite, LogLevel};
use crate::shipper::Shipper;

/// Visitor that extracts the message and stringified fields from an event.
struct FieldVisitor {
    fields: HashMap<String, String>,
    message: Option<String>,
}

impl FieldVisitor {
    fn new() -> Self {
        Self {
            fields: HashMap::new(),
            message: None,
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let value_str = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(value_str);
        } else {
            self.fields.insert(field.name().to_string(), value_str);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }
}

/// Map a tracing verbosity level onto a record level.
fn map_level(level: Level) -> LogLevel {
    match level {
        Level::TRACE => LogLevel::Trace,
        Level::DEBUG => LogLevel::Debug,
        Level::INFO => LogLevel::Info,
        Level::WARN => LogLevel::Warning,
        Level::ERROR => LogLevel::Error,
    }
}

/// Layer that buffers every tracing event as a shippable log record.
///
/// # Example
///
/// ```no_run
/// use logship::{AppInfo, Shipper, ShipperConfig, ShipperLayer};
/// use std::sync::Arc;
/// use tracing_subscriber::prelude::*;
///
/// let config = ShipperConfig::new("https://logs.example.com/ingest", "app", "secret");
/// let shipper = Arc::new(Shipper::new(config, AppInfo::default()).unwrap());
///
/// tracing_subscriber::registry()
///     .with(ShipperLayer::new(Arc::clone(&shipper)))
///     .init();
///
/// tracing::warn!(disk_free_mb = 12, "disk space low");
/// ```
pub struct ShipperLayer {
    shipper: Arc<Shipper>,
}

impl ShipperLayer {
    /// Create a layer forwarding events into the given shipper.
    pub fn new(shipper: Arc<Shipper>) -> Self {
        Self { shipper }
    }
}

impl<S> Layer<S> for ShipperLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::new();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let site = CallSite {
            file: metadata.file().unwrap_or(""),
            function: metadata.target(),
            line: metadata.line().unwrap_or(0),
        };

        self.shipper.append(
            map_level(*metadata.level()),
            visitor.message.unwrap_or_default(),
            visitor.fields,
            site,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppInfo;
    use crate::record::Environment;
    use crate::store::{DurableStore, StoreError};
    use crate::transport::{Transport, TransportError};
    use crate::record::LogRecord;
    use async_trait::async_trait;
    use tracing_subscriber::prelude::*;

    struct NullTransport;

    #[async_trait]
    impl Transport for NullTransport {
        async fn post(&self, _payload: Vec<u8>) -> Result<u16, TransportError> {
            Ok(200)
        }
    }

    struct NullStore;

    impl DurableStore for NullStore {
        fn save(&self, _batch: &[LogRecord]) -> Result<(), StoreError> {
            Ok(())
        }
        fn load(&self) -> Result<Option<Vec<LogRecord>>, StoreError> {
            Ok(None)
        }
        fn remove(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn test_shipper() -> Arc<Shipper> {
        let app = AppInfo::new(Environment::Testing, "1.0", "host", "0.1.0", "1");
        Arc::new(Shipper::with_parts(
            Arc::new(NullTransport),
            Arc::new(NullStore),
            app,
        ))
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(map_level(Level::TRACE), LogLevel::Trace);
        assert_eq!(map_level(Level::DEBUG), LogLevel::Debug);
        assert_eq!(map_level(Level::INFO), LogLevel::Info);
        assert_eq!(map_level(Level::WARN), LogLevel::Warning);
        assert_eq!(map_level(Level::ERROR), LogLevel::Error);
    }

    #[test]
    fn test_events_become_buffered_records() {
        let shipper = test_shipper();
        let subscriber =
            tracing_subscriber::registry().with(ShipperLayer::new(Arc::clone(&shipper)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(disk_free_mb = 12, volume = "/data", "disk space low");
            tracing::info!("startup complete");
        });

        assert_eq!(shipper.pending(), 2);
    }

    #[derive(Default)]
    struct CapturingTransport {
        payloads: parking_lot::Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl Transport for CapturingTransport {
        async fn post(&self, payload: Vec<u8>) -> Result<u16, TransportError> {
            self.payloads.lock().push(payload);
            Ok(200)
        }
    }

    #[tokio::test]
    async fn test_shipped_record_carries_event_metadata() {
        let app = AppInfo::new(Environment::Testing, "1.0", "host", "0.1.0", "1");
        let transport = Arc::new(CapturingTransport::default());
        let shipper = Arc::new(Shipper::with_parts(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::new(NullStore),
            app,
        ));

        let subscriber =
            tracing_subscriber::registry().with(ShipperLayer::new(Arc::clone(&shipper)));
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(code = 7, "sync failed");
        });

        shipper.deliver().await;

        let payloads = transport.payloads.lock();
        let batch: Vec<LogRecord> = serde_json::from_slice(&payloads[0]).unwrap();
        assert_eq!(batch.len(), 1);
        let record = &batch[0];
        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.message, "sync failed");
        assert_eq!(record.data.get("code").unwrap(), "7");
        assert!(record.data.get("debugFile").unwrap().ends_with("layer.rs"));
        assert!(record
            .data
            .get("debugFunction")
            .unwrap()
            .contains("logship"));
        assert_ne!(record.data.get("debugLine").unwrap(), "0");
    }
}

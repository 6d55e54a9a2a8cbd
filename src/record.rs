//! Log record data model.
//!
//! Defines the wire-level record shape shared by the HTTP payload and the
//! durable snapshot file: a timestamped, leveled message enriched with
//! environment metadata and a free-form string map.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AppInfo;

/// Metadata keys injected into every record's `data` map, identifying the
/// call site of the log statement.
pub const DEBUG_FILE_KEY: &str = "debugFile";
pub const DEBUG_FUNCTION_KEY: &str = "debugFunction";
pub const DEBUG_LINE_KEY: &str = "debugLine";

/// Log severity levels, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Get all log levels in ascending severity order.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Notice,
            LogLevel::Warning,
            LogLevel::Error,
            LogLevel::Critical,
        ]
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Notice => write!(f, "notice"),
            LogLevel::Warning => write!(f, "warning"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Deployment environment a record was produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Call-site information attached to a record's `data` map.
///
/// Usually captured with the [`call_site!`](crate::call_site) macro rather
/// than constructed by hand.
#[derive(Debug, Clone, Copy)]
pub struct CallSite {
    /// Source file of the log statement
    pub file: &'static str,

    /// Enclosing module or function path
    pub function: &'static str,

    /// Line number of the log statement
    pub line: u32,
}

/// Capture the current call site for [`Shipper::append`](crate::Shipper::append).
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::record::CallSite {
            file: file!(),
            function: module_path!(),
            line: line!(),
        }
    };
}

/// A single structured log event.
///
/// Immutable once constructed; the same serde model is used for the
/// outbound JSON payload and the on-disk snapshot, so a record that fails
/// to send round-trips byte-for-byte through the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Instant the record was created
    pub timestamp: DateTime<Utc>,

    /// Severity level
    pub level: LogLevel,

    /// Log message content
    pub message: String,

    /// Deployment environment
    pub environment: Environment,

    /// Operating system version of the host
    pub os_version: String,

    /// Device or machine model
    pub device: String,

    /// Application version
    pub version: String,

    /// Application build number
    pub build: String,

    /// Free-form metadata, including the injected call-site entries
    pub data: HashMap<String, String>,
}

impl LogRecord {
    /// Create a new record stamped with the injected environment metadata
    /// and the call-site entries merged into `data`.
    pub fn new(
        level: LogLevel,
        message: impl Into<String>,
        app: &AppInfo,
        mut data: HashMap<String, String>,
        site: CallSite,
    ) -> Self {
        data.insert(DEBUG_FILE_KEY.to_string(), site.file.to_string());
        data.insert(DEBUG_FUNCTION_KEY.to_string(), site.function.to_string());
        data.insert(DEBUG_LINE_KEY.to_string(), site.line.to_string());

        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            environment: app.environment,
            os_version: app.os_version.clone(),
            device: app.device.clone(),
            version: app.version.clone(),
            build: app.build.clone(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_app_info() -> AppInfo {
        AppInfo {
            environment: Environment::Testing,
            os_version: "14.2".to_string(),
            device: "TestDevice".to_string(),
            version: "1.2.3".to_string(),
            build: "456".to_string(),
        }
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Notice);
        assert!(LogLevel::Notice < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Critical);
    }

    #[test]
    fn test_level_serializes_lowercase() {
        for level in LogLevel::all() {
            let json = serde_json::to_string(level).unwrap();
            assert_eq!(json, format!("\"{}\"", level));
        }
    }

    #[test]
    fn test_record_creation_injects_call_site() {
        let site = CallSite {
            file: "src/main.rs",
            function: "app::startup",
            line: 42,
        };
        let record = LogRecord::new(
            LogLevel::Info,
            "started",
            &test_app_info(),
            HashMap::new(),
            site,
        );

        assert_eq!(record.data.get(DEBUG_FILE_KEY).unwrap(), "src/main.rs");
        assert_eq!(record.data.get(DEBUG_FUNCTION_KEY).unwrap(), "app::startup");
        assert_eq!(record.data.get(DEBUG_LINE_KEY).unwrap(), "42");
        assert_eq!(record.environment, Environment::Testing);
        assert_eq!(record.device, "TestDevice");
    }

    #[test]
    fn test_call_site_macro_captures_location() {
        let site = call_site!();
        assert!(site.file.ends_with("record.rs"));
        assert!(site.function.contains("record::tests"));
        assert!(site.line > 0);
    }

    #[test]
    fn test_wire_field_names() {
        let record = LogRecord::new(
            LogLevel::Warning,
            "disk almost full",
            &test_app_info(),
            HashMap::new(),
            call_site!(),
        );
        let json = serde_json::to_string(&record).unwrap();

        assert!(json.contains("\"timestamp\":"));
        assert!(json.contains("\"level\":\"warning\""));
        assert!(json.contains("\"environment\":\"testing\""));
        assert!(json.contains("\"os_version\":\"14.2\""));
        assert!(json.contains("\"device\":\"TestDevice\""));
        assert!(json.contains("\"version\":\"1.2.3\""));
        assert!(json.contains("\"build\":\"456\""));
        assert!(json.contains("\"data\":"));
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let mut data = HashMap::new();
        data.insert("user".to_string(), "안녕하세요 🚀".to_string());
        data.insert("empty".to_string(), String::new());

        let original = LogRecord {
            timestamp: Utc.with_ymd_and_hms(2023, 7, 14, 9, 30, 15).unwrap()
                + chrono::Duration::nanoseconds(123_456_789),
            level: LogLevel::Critical,
            message: "Ünïcödé message — ログ".to_string(),
            environment: Environment::Production,
            os_version: "17.0.1".to_string(),
            device: "iPhone15,2".to_string(),
            version: "2.0.0".to_string(),
            build: "1024".to_string(),
            data,
        };

        let encoded = serde_json::to_vec(&original).unwrap();
        let decoded: LogRecord = serde_json::from_slice(&encoded).unwrap();

        assert_eq!(decoded, original);
        assert_eq!(decoded.timestamp, original.timestamp);
    }

    #[test]
    fn test_round_trip_empty_batch() {
        let batch: Vec<LogRecord> = Vec::new();
        let encoded = serde_json::to_vec(&batch).unwrap();
        let decoded: Vec<LogRecord> = serde_json::from_slice(&encoded).unwrap();
        assert!(decoded.is_empty());
    }
}

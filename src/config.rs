//! Configuration for the log shipper.
//!
//! Provides programmatic construction plus environment-based loading of the
//! delivery endpoint, credentials, durable-store location, and request
//! timeout, along with the environment metadata stamped into every record.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::record::Environment;

/// Default HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Minimum allowed request timeout.
const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;

/// Maximum allowed request timeout.
const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Directory name used under the platform-local data dir when no storage
/// directory is configured.
const DEFAULT_STORAGE_SUBDIR: &str = "logship";

/// Configuration for a [`Shipper`](crate::Shipper).
///
/// All settings can also be loaded from environment variables:
/// - `LOGSHIP_ENDPOINT`: log collection endpoint URL (required)
/// - `LOGSHIP_USERNAME`: basic-auth username (default: empty)
/// - `LOGSHIP_PASSWORD`: basic-auth password (default: empty)
/// - `LOGSHIP_STORAGE_DIR`: durable snapshot directory (default: platform data dir)
/// - `LOGSHIP_REQUEST_TIMEOUT_SECS`: HTTP request timeout (default: 30)
#[derive(Debug, Clone)]
pub struct ShipperConfig {
    /// Full URL of the log collection endpoint
    pub endpoint: String,

    /// Username for HTTP basic authentication
    pub username: String,

    /// Password for HTTP basic authentication
    pub password: String,

    /// Directory holding the durable snapshot file
    pub storage_dir: PathBuf,

    /// HTTP request timeout duration
    pub request_timeout: Duration,
}

/// Error type for configuration loading failures.
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub env_var: Option<String>,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.env_var {
            Some(var) => write!(f, "Configuration error for {}: {}", var, self.message),
            None => write!(f, "Configuration error: {}", self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ShipperConfig {
    /// Create a configuration with the given endpoint and credentials,
    /// using the default storage directory and request timeout.
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            storage_dir: default_storage_dir(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Override the directory holding the durable snapshot file.
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Override the HTTP request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `LOGSHIP_ENDPOINT` is missing or not an `http(s)` URL
    /// - `LOGSHIP_REQUEST_TIMEOUT_SECS` is not a valid number or out of bounds
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = Self::parse_endpoint()?;

        let username = env::var("LOGSHIP_USERNAME").unwrap_or_default();
        let password = env::var("LOGSHIP_PASSWORD").unwrap_or_default();

        let storage_dir = env::var("LOGSHIP_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_storage_dir());

        let timeout_secs = Self::parse_request_timeout()?;

        Ok(Self {
            endpoint,
            username,
            password,
            storage_dir,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Parse and validate the endpoint URL from the environment.
    fn parse_endpoint() -> Result<String, ConfigError> {
        let env_var = "LOGSHIP_ENDPOINT";

        let endpoint = env::var(env_var).map_err(|_| ConfigError {
            message: "endpoint URL must be set".to_string(),
            env_var: Some(env_var.to_string()),
        })?;

        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError {
                message: format!("'{}' is not an http(s) URL", endpoint),
                env_var: Some(env_var.to_string()),
            });
        }

        Ok(endpoint)
    }

    /// Parse the request timeout from the environment with validation.
    fn parse_request_timeout() -> Result<u64, ConfigError> {
        let env_var = "LOGSHIP_REQUEST_TIMEOUT_SECS";

        match env::var(env_var) {
            Ok(value) => {
                let timeout: u64 = value.parse().map_err(|_| ConfigError {
                    message: format!("'{}' is not a valid number", value),
                    env_var: Some(env_var.to_string()),
                })?;

                if timeout < MIN_REQUEST_TIMEOUT_SECS {
                    return Err(ConfigError {
                        message: format!(
                            "timeout {} is below minimum ({}s)",
                            timeout, MIN_REQUEST_TIMEOUT_SECS
                        ),
                        env_var: Some(env_var.to_string()),
                    });
                }

                if timeout > MAX_REQUEST_TIMEOUT_SECS {
                    return Err(ConfigError {
                        message: format!(
                            "timeout {} exceeds maximum ({}s)",
                            timeout, MAX_REQUEST_TIMEOUT_SECS
                        ),
                        env_var: Some(env_var.to_string()),
                    });
                }

                Ok(timeout)
            }
            Err(_) => Ok(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Resolve the default durable storage directory.
fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(env::temp_dir)
        .join(DEFAULT_STORAGE_SUBDIR)
}

/// Host environment metadata stamped into every record.
///
/// Captured once at construction so record creation performs no
/// platform-specific lookups.
#[derive(Debug, Clone)]
pub struct AppInfo {
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
}

impl AppInfo {
    /// Create environment metadata with the given values.
    pub fn new(
        environment: Environment,
        os_version: impl Into<String>,
        device: impl Into<String>,
        version: impl Into<String>,
        build: impl Into<String>,
    ) -> Self {
        Self {
            environment,
            os_version: os_version.into(),
            device: device.into(),
            version: version.into(),
            build: build.into(),
        }
    }
}

impl Default for AppInfo {
    /// Placeholder metadata for development and tests.
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            os_version: String::new(),
            device: String::new(),
            version: String::new(),
            build: String::new(),
        }
    }
}

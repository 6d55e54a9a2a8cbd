//! HTTP transport for delivering encoded batches.
//!
//! The shipper talks to the network through the [`Transport`] trait; the
//! production implementation wraps a pooled `reqwest` client performing a
//! single authenticated POST per delivery cycle.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::config::ShipperConfig;

/// HTTP status treated as delivery success. Anything else is a failure.
pub const SUCCESS_STATUS: u16 = 200;

/// Errors that can occur while submitting a batch.
#[derive(Debug)]
pub enum TransportError {
    /// HTTP request failed (connectivity, DNS, TLS)
    Request(reqwest::Error),

    /// Request timed out
    Timeout,

    /// Transport configuration error
    Config(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Request(e) => write!(f, "HTTP request failed: {}", e),
            TransportError::Timeout => write!(f, "Request timed out"),
            TransportError::Config(e) => write!(f, "Transport configuration error: {}", e),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(err)
        }
    }
}

/// One-shot delivery of an encoded batch.
///
/// Implementations own the endpoint, authentication, and any request
/// timeout; a timeout must surface as a `TransportError` so the caller
/// takes the failure path.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST the payload and return the response status code.
    async fn post(&self, payload: Vec<u8>) -> Result<u16, TransportError>;
}

/// Production transport: authenticated JSON POST via a pooled HTTP client.
pub struct HttpTransport {
    /// The underlying HTTP client (reused for connection pooling)
    client: Client,

    /// URL of the log collection endpoint
    endpoint: String,

    /// Basic-auth username
    username: String,

    /// Basic-auth password
    password: String,
}

impl HttpTransport {
    /// Build a transport from the shipper configuration.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Config` if the HTTP client cannot be built.
    pub fn new(config: &ShipperConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Get the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, payload: Vec<u8>) -> Result<u16, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .basic_auth(&self.username, Some(&self.password))
            .body(payload)
            .send()
            .await?;

        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        let config = ShipperConfig::new("https://logs.example.com/ingest", "user", "pass");
        let transport = HttpTransport::new(&config).expect("client should build");
        assert_eq!(transport.endpoint(), "https://logs.example.com/ingest");
    }

    #[test]
    fn test_error_display() {
        let err = TransportError::Timeout;
        assert_eq!(format!("{}", err), "Request timed out");

        let err = TransportError::Config("bad tls".to_string());
        assert!(format!("{}", err).contains("bad tls"));
    }

    #[tokio::test]
    async fn test_post_sends_authenticated_json_request() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Minimal one-shot HTTP server capturing the raw request
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") && request.ends_with(b"[]") {
                    break;
                }
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
                .await
                .unwrap();
            String::from_utf8(request).unwrap()
        });

        let config = ShipperConfig::new(format!("http://{}/ingest", addr), "user", "pass");
        let transport = HttpTransport::new(&config).unwrap();

        let status = transport.post(b"[]".to_vec()).await.unwrap();
        assert_eq!(status, SUCCESS_STATUS);

        let request = server.await.unwrap();
        let lowercased = request.to_ascii_lowercase();
        assert!(lowercased.starts_with("post /ingest http/1.1"));
        assert!(lowercased.contains("content-type: application/json"));
        assert!(lowercased.contains("authorization: basic"));
        // base64("user:pass")
        assert!(request.contains("dXNlcjpwYXNz"));
        assert!(request.ends_with("[]"));
    }
}

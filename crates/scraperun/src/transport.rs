//! # Transport Abstraction
//!
//! A minimal, async interface for one HTTP exchange with the endpoint.
//!
//! ## Philosophy
//!
//! - **Envelope-Blind**: The transport moves a request and returns status plus
//!   raw body. It never parses JSON or decides what counts as success.
//! - **Request-Response**: "send request, await response". Fallback, timeouts
//!   and callback routing are built on top of this, not defined here.

use std::fmt;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use url::Url;

/// Errors that occur at the network/transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint could not be reached (refused, DNS, TLS, cross-origin rejection).
    Connect(String),
    /// The endpoint answered with a non-2xx status.
    Status(u16),
    /// The endpoint answered, but the body is not an envelope.
    Malformed(String),
    /// Generic I/O error or internal transport failure.
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(msg) => write!(f, "Connection failed: {}", msg),
            Self::Status(code) => write!(f, "HTTP error! status: {}", code),
            Self::Malformed(msg) => write!(f, "Malformed response: {}", msg),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

pub type Result<T> = std::result::Result<T, TransportError>;

/// One outgoing exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpRequest {
    Get(Url),
    PostJson { url: Url, body: Vec<u8> },
}

impl HttpRequest {
    pub fn url(&self) -> &Url {
        match self {
            Self::Get(url) => url,
            Self::PostJson { url, .. } => url,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A mechanism to send a request and receive a reply.
///
/// This trait is designed to be object-safe (`Arc<dyn HttpTransport>`).
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    /// Performs the exchange.
    ///
    /// # invariants
    /// - Must return `Ok` for any response that arrived, whatever its status.
    /// - Must return `Err` if no response arrived.
    /// - Should not interpret the body.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// The production transport, backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Io(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let builder = match request {
            HttpRequest::Get(url) => self.client.get(url),
            HttpRequest::PostJson { url, body } => self
                .client
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body),
        };

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_connect() || e.is_request() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Io(e.to_string())
    }
}

/// Cache-busting nonce: milliseconds since the Unix epoch.
pub fn cache_buster() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

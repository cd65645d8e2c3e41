//! # Direct Transport
//!
//! One plain request/response exchange against the endpoint.
//!
//! Classification of what comes back:
//!
//! - no response, non-2xx status, body that is not an envelope, budget spent
//!   → transport-level (`CallError::Transport` / `CallError::Timeout`), a
//!   fallback candidate;
//! - an envelope carrying an error indicator → `CallError::Application`,
//!   returned as-is.

use std::sync::Arc;
use std::time::Duration;

use scrapewire::CallRequest;
use scrapewire::Envelope;
use scrapewire::Reply;
use tracing::debug;
use url::Url;

use crate::config::DirectMode;
use crate::error::CallError;
use crate::error::Result;
use crate::transport::HttpRequest;
use crate::transport::HttpTransport;
use crate::transport::TransportError;
use crate::transport::cache_buster;

#[derive(Clone)]
pub struct DirectTransport {
    http: Arc<dyn HttpTransport>,
    mode: DirectMode,
}

impl DirectTransport {
    pub fn new(http: Arc<dyn HttpTransport>, mode: DirectMode) -> Self {
        Self { http, mode }
    }

    pub fn mode(&self) -> DirectMode {
        self.mode
    }

    /// Builds the wire request for `request` in the configured mode.
    pub fn encode(&self, endpoint: &Url, request: &CallRequest) -> Result<HttpRequest> {
        match self.mode {
            DirectMode::Query => Ok(HttpRequest::Get(request.to_query_url(endpoint, cache_buster()))),
            DirectMode::Body => {
                let body = serde_json::to_vec(&request.to_body())
                    .map_err(|e| TransportError::Io(format!("failed to encode body: {}", e)))?;
                Ok(HttpRequest::PostJson {
                    url: endpoint.clone(),
                    body,
                })
            }
        }
    }

    /// Sends the call and awaits the reply within `budget`.
    pub async fn call(&self, endpoint: &Url, request: &CallRequest, budget: Duration) -> Result<Reply> {
        let http_request = self.encode(endpoint, request)?;
        debug!(url = %http_request.url(), mode = ?self.mode, "direct request");

        let response = match tokio::time::timeout(budget, self.http.execute(http_request)).await {
            Ok(response) => response?,
            Err(_) => return Err(CallError::Timeout),
        };

        // non-2xx is transport-level even when the body holds an error envelope
        if !response.is_success() {
            return Err(TransportError::Status(response.status).into());
        }

        let envelope = Envelope::from_slice(&response.body)
            .map_err(|e| TransportError::Malformed(e.to_string()))?;
        envelope.into_reply().map_err(CallError::Application)
    }
}

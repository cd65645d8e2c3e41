//! # Remote Call Client
//!
//! `RemoteCallClient::invoke` is the only way callers reach the endpoint.
//!
//! 1. No endpoint → `Failure("endpoint not configured")`, nothing sent.
//! 2. Direct transport with the full budget.
//! 3. On a transport-level failure, and if fallback is enabled, the callback
//!    transport with a fresh budget.
//! 4. The settled outcome, normalized into a `CallResult`.
//!
//! `invoke` never panics and never returns early without a result.

use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;

use scrapewire::CallRequest;
use scrapewire::Reply;
use serde_json::Map;
use serde_json::Value;
use tracing::info;
use tracing::warn;
use url::Url;

use crate::callback::CallbackTransport;
use crate::config;
use crate::config::ClientConfig;
use crate::config::ConfigError;
use crate::config::DirectMode;
use crate::config::FallbackPolicy;
use crate::delivery::Delivery;
use crate::delivery::ScriptDelivery;
use crate::direct::DirectTransport;
use crate::error::CallError;
use crate::outcome::CallResult;
use crate::registry::CallbackRegistry;
use crate::scrape;
use crate::scrape::ScrapeOptions;
use crate::transport::HttpTransport;
use crate::transport::ReqwestTransport;

pub struct RemoteCallClient {
    endpoint: RwLock<Option<Url>>,
    timeout: Duration,
    direct: DirectTransport,
    callback: Option<CallbackTransport>,
}

impl RemoteCallClient {
    /// A client with the default transports and the given configuration.
    pub fn new(config: ClientConfig) -> config::Result<Self> {
        ClientBuilder::from_config(config).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Replaces the endpoint. Blank input clears it.
    pub fn set_endpoint(&self, raw: &str) -> config::Result<()> {
        let endpoint = config::parse_endpoint(raw)?;
        let mut guard = self.endpoint.write().unwrap_or_else(|e| e.into_inner());
        *guard = endpoint;
        Ok(())
    }

    pub fn endpoint(&self) -> Option<Url> {
        self.endpoint.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The callback registry, when fallback is enabled.
    pub fn callback_registry(&self) -> Option<&Arc<CallbackRegistry>> {
        self.callback.as_ref().map(CallbackTransport::registry)
    }

    /// Calls `function` on the endpoint and normalizes whatever happens.
    pub async fn invoke(&self, function: &str, payload: Map<String, Value>) -> CallResult {
        let request = CallRequest::with_payload(function, payload);
        self.call(&request).await.into()
    }

    /// Same as `invoke`, before normalization.
    pub async fn call(&self, request: &CallRequest) -> Result<Reply, CallError> {
        let Some(endpoint) = self.endpoint() else {
            return Err(CallError::not_configured());
        };
        info!(function = %request.function, "calling remote function");

        let direct_err = match self.direct.call(&endpoint, request, self.timeout).await {
            Err(e) if e.is_fallback_eligible() => e,
            settled => return settled,
        };

        let Some(callback) = &self.callback else {
            warn!(error = %direct_err, "direct request failed, fallback disabled");
            return Err(direct_err);
        };

        warn!(error = %direct_err, "direct request failed, retrying through callback transport");
        let settled = callback.call(&endpoint, request, self.timeout).await;
        if let Err(e) = &settled {
            warn!(error = %e, "callback transport failed");
        }
        settled
    }

    /// Scrapes `url` through the endpoint's `scrapeAndSave` function.
    pub async fn scrape_and_save(&self, url: &str, options: ScrapeOptions) -> CallResult {
        self.invoke(scrape::SCRAPE_FUNCTION, scrape::scrape_payload(url, options))
            .await
    }

    /// Pings the endpoint's `testConnection` function.
    pub async fn test_connection(&self) -> bool {
        let result = self.invoke(scrape::TEST_CONNECTION_FUNCTION, Map::new()).await;
        match result.error_message() {
            None => info!("connection test passed"),
            Some(message) => warn!(error = %message, "connection test failed"),
        }
        result.is_success()
    }
}

/// Fluent builder for a `RemoteCallClient`.
pub struct ClientBuilder {
    config: ClientConfig,
    http: Option<Arc<dyn HttpTransport>>,
    delivery: Option<Arc<dyn Delivery>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::from_config(ClientConfig::default())
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            http: None,
            delivery: None,
        }
    }

    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.config.endpoint = Some(endpoint);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn direct_mode(mut self, mode: DirectMode) -> Self {
        self.config.direct_mode = mode;
        self
    }

    pub fn fallback(mut self, policy: FallbackPolicy) -> Self {
        self.config.fallback = policy;
        self
    }

    /// Overrides the HTTP transport used by the direct path (and by the
    /// default script delivery).
    pub fn http(mut self, http: Arc<dyn HttpTransport>) -> Self {
        self.http = Some(http);
        self
    }

    /// Overrides how callback scripts are delivered.
    pub fn delivery(mut self, delivery: Arc<dyn Delivery>) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn build(self) -> config::Result<RemoteCallClient> {
        let http: Arc<dyn HttpTransport> = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestTransport::new().map_err(|e| ConfigError::Http(e.to_string()))?),
        };

        let callback = match self.config.fallback {
            FallbackPolicy::Disabled => None,
            FallbackPolicy::Callback => {
                let delivery = self
                    .delivery
                    .unwrap_or_else(|| Arc::new(ScriptDelivery::new(http.clone())));
                Some(CallbackTransport::new(delivery))
            }
        };

        Ok(RemoteCallClient {
            endpoint: RwLock::new(self.config.endpoint),
            timeout: self.config.timeout,
            direct: DirectTransport::new(http, self.config.direct_mode),
            callback,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

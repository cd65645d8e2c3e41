//! # Callback Transport
//!
//! The fallback path: register a uniquely named handler, inject a script that
//! calls it, and wait for exactly one of
//!
//! 1. the handler being invoked → resolve or reject on the envelope;
//! 2. the budget elapsing → `CallError::Timeout`;
//! 3. the injection reporting a load failure → `CallError::TransportLoad`.
//!
//! The `PendingCall` guard is dropped on every one of those paths (and when the
//! caller stops polling), so neither the handler nor the injection outlives
//! the attempt.

use std::sync::Arc;
use std::time::Duration;

use scrapewire::CallRequest;
use scrapewire::Envelope;
use scrapewire::Reply;
use tracing::debug;
use url::Url;

use crate::delivery::Delivery;
use crate::error::CallError;
use crate::error::Result;
use crate::registry::CallbackRegistry;
use crate::registry::Settlement;
use crate::transport::TransportError;
use crate::transport::cache_buster;

#[derive(Clone)]
pub struct CallbackTransport {
    registry: Arc<CallbackRegistry>,
    delivery: Arc<dyn Delivery>,
}

impl CallbackTransport {
    pub fn new(delivery: Arc<dyn Delivery>) -> Self {
        Self {
            registry: Arc::new(CallbackRegistry::new()),
            delivery,
        }
    }

    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    pub async fn call(&self, endpoint: &Url, request: &CallRequest, budget: Duration) -> Result<Reply> {
        let (pending, rx) = self.registry.register();
        let url = request.to_callback_url(endpoint, pending.id(), cache_buster());
        debug!(callback = %pending.id(), url = %url, "injecting callback script");

        let injection = self.delivery.inject(url, self.registry.sink(pending.id()));
        pending.attach(injection);

        let settled = tokio::time::timeout(budget, rx).await;
        debug!(callback = %pending.id(), timed_out = settled.is_err(), "callback settled");
        drop(pending);

        match settled {
            Ok(Ok(Settlement::Response(payload))) => {
                let envelope = Envelope::from_value(payload)
                    .map_err(|e| TransportError::Malformed(e.to_string()))?;
                envelope.into_reply().map_err(CallError::Application)
            }
            Ok(Ok(Settlement::LoadFailed(reason))) => Err(CallError::TransportLoad(reason)),
            Ok(Err(_)) => Err(CallError::TransportLoad("callback channel closed".into())),
            Err(_) => Err(CallError::Timeout),
        }
    }
}

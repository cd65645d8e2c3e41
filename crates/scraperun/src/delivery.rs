//! # Out-of-Band Delivery
//!
//! The capability behind the callback transport: load remote content that
//! calls a named handler back, and tell us if the load itself failed.
//!
//! A `Delivery` starts the load and returns an `Injection`, the transient
//! artifact of that load. The registry removes it once the call settles.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

use crate::registry::CallbackSink;
use crate::transport::HttpRequest;
use crate::transport::HttpTransport;

/// Starts delivery of one callback script.
///
/// Implementations must eventually do one of: invoke a handler through the
/// sink, report `load_failed`, or nothing (the caller's timeout covers that).
pub trait Delivery: Send + Sync + 'static {
    fn inject(&self, script_url: Url, sink: CallbackSink) -> Box<dyn Injection>;
}

/// The artifact left behind by one `Delivery::inject`.
pub trait Injection: Send + Sync + 'static {
    fn remove(self: Box<Self>);
}

/// Fetches the callback script over HTTP and runs it against the registry.
#[derive(Clone)]
pub struct ScriptDelivery {
    http: Arc<dyn HttpTransport>,
}

impl ScriptDelivery {
    pub fn new(http: Arc<dyn HttpTransport>) -> Self {
        Self { http }
    }
}

impl Delivery for ScriptDelivery {
    fn inject(&self, script_url: Url, sink: CallbackSink) -> Box<dyn Injection> {
        let http = self.http.clone();

        let task = tokio::spawn(async move {
            let response = match http.execute(HttpRequest::Get(script_url)).await {
                Ok(response) => response,
                Err(e) => {
                    sink.load_failed(e.to_string());
                    return;
                }
            };

            if !response.is_success() {
                sink.load_failed(format!("HTTP error! status: {}", response.status));
                return;
            }

            let body = match std::str::from_utf8(&response.body) {
                Ok(body) => body,
                Err(e) => {
                    sink.load_failed(format!("unreadable callback script: {}", e));
                    return;
                }
            };
            match sink.run_script(body) {
                Ok(true) => {}
                Ok(false) => debug!(callback = %sink.id(), "callback already settled"),
                Err(e) => {
                    sink.load_failed(format!("unreadable callback script: {}", e));
                }
            }
        });

        Box::new(SpawnedScript(task))
    }
}

/// A script load running as a tokio task. Removing it aborts the task.
struct SpawnedScript(JoinHandle<()>);

impl Injection for SpawnedScript {
    fn remove(self: Box<Self>) {
        self.0.abort();
    }
}

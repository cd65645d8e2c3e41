//! Mock transports and deliveries for testing.
//!
//! These are used by the test suites and are not part of the stable API.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use scrapewire::ReceivedCall;
use scrapewire::script;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use url::Url;

use crate::delivery::Delivery;
use crate::delivery::Injection;
use crate::registry::CallbackSink;
use crate::transport;
use crate::transport::HttpRequest;
use crate::transport::HttpResponse;
use crate::transport::HttpTransport;
use crate::transport::TransportError;

/// A request-response mock transport driven by a closure.
///
/// Records every request it sees.
pub struct FnHttp<F>
where
    F: Fn(&HttpRequest) -> transport::Result<HttpResponse> + Send + Sync,
{
    handler: F,
    requests: Mutex<Vec<HttpRequest>>,
}

impl<F> FnHttp<F>
where
    F: Fn(&HttpRequest) -> transport::Result<HttpResponse> + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn calls(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait::async_trait]
impl<F> HttpTransport for FnHttp<F>
where
    F: Fn(&HttpRequest) -> transport::Result<HttpResponse> + Send + Sync + 'static,
{
    async fn execute(&self, request: HttpRequest) -> transport::Result<HttpResponse> {
        self.requests.lock().await.push(request.clone());
        (self.handler)(&request)
    }
}

/// A transport that always answers with the same JSON body.
pub fn json_http(
    status: u16,
    body: Value,
) -> FnHttp<impl Fn(&HttpRequest) -> transport::Result<HttpResponse> + Send + Sync + 'static> {
    let bytes = body.to_string().into_bytes();
    FnHttp::new(move |_| {
        Ok(HttpResponse {
            status,
            body: bytes.clone(),
        })
    })
}

/// A transport that always fails before any response arrives.
pub fn failing_http(
    error: TransportError,
) -> FnHttp<impl Fn(&HttpRequest) -> transport::Result<HttpResponse> + Send + Sync + 'static> {
    FnHttp::new(move |_| Err(error.clone()))
}

/// A transport that never answers.
pub struct HangingHttp;

#[async_trait::async_trait]
impl HttpTransport for HangingHttp {
    async fn execute(&self, _request: HttpRequest) -> transport::Result<HttpResponse> {
        std::future::pending().await
    }
}

/// What a scripted delivery does with an injected call.
#[derive(Debug, Clone, PartialEq)]
pub enum Scripted {
    /// Run `handler(payload)` as the loaded script.
    Respond(Value),
    /// Report a load failure.
    Fail(String),
    /// Load nothing, never call back.
    Hang,
}

/// Counts live injections so tests can assert nothing is left behind.
#[derive(Clone, Default)]
pub struct InjectionCounter {
    live: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
}

impl InjectionCounter {
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn track(&self) -> Box<dyn Injection> {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        Box::new(TrackedInjection {
            live: self.live.clone(),
        })
    }
}

struct TrackedInjection {
    live: Arc<AtomicUsize>,
}

impl Injection for TrackedInjection {
    fn remove(self: Box<Self>) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A delivery that answers from a closure, out of band (on a spawned task).
pub struct ScriptedDelivery<F>
where
    F: Fn(&ReceivedCall) -> Scripted + Send + Sync,
{
    handler: Arc<F>,
    counter: InjectionCounter,
    seen: Arc<Mutex<Vec<ReceivedCall>>>,
}

impl<F> ScriptedDelivery<F>
where
    F: Fn(&ReceivedCall) -> Scripted + Send + Sync + 'static,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler: Arc::new(handler),
            counter: InjectionCounter::default(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn counter(&self) -> InjectionCounter {
        self.counter.clone()
    }

    pub async fn seen(&self) -> Vec<ReceivedCall> {
        self.seen.lock().await.clone()
    }
}

impl<F> Delivery for ScriptedDelivery<F>
where
    F: Fn(&ReceivedCall) -> Scripted + Send + Sync + 'static,
{
    fn inject(&self, script_url: Url, sink: CallbackSink) -> Box<dyn Injection> {
        let handler = self.handler.clone();
        let seen = self.seen.clone();

        tokio::spawn(async move {
            let call = match ReceivedCall::from_url(&script_url) {
                Ok(call) => call,
                Err(e) => {
                    sink.load_failed(e.to_string());
                    return;
                }
            };
            seen.lock().await.push(call.clone());

            match handler(&call) {
                Scripted::Respond(payload) => {
                    let name = call.callback.unwrap_or_default();
                    let _ = sink.run_script(&script::wrap(&name, &payload));
                }
                Scripted::Fail(reason) => {
                    sink.load_failed(reason);
                }
                Scripted::Hang => {}
            }
        });

        self.counter.track()
    }
}

/// A delivery that hands every sink to the test to drive by hand.
#[derive(Clone)]
pub struct ManualDelivery {
    tx: mpsc::UnboundedSender<(Url, CallbackSink)>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<(Url, CallbackSink)>>>,
    counter: InjectionCounter,
}

impl ManualDelivery {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            counter: InjectionCounter::default(),
        }
    }

    pub fn counter(&self) -> InjectionCounter {
        self.counter.clone()
    }

    /// Waits for the next `count` injections, in the order they happened.
    pub async fn wait_for(&self, count: usize) -> Vec<(Url, CallbackSink)> {
        let mut rx = self.rx.lock().await;
        let mut sinks = Vec::with_capacity(count);
        while sinks.len() < count {
            // self.tx keeps the channel open, so this only ends on a new injection
            if let Some(injected) = rx.recv().await {
                sinks.push(injected);
            }
        }
        sinks
    }
}

impl Default for ManualDelivery {
    fn default() -> Self {
        Self::new()
    }
}

impl Delivery for ManualDelivery {
    fn inject(&self, script_url: Url, sink: CallbackSink) -> Box<dyn Injection> {
        let _ = self.tx.send((script_url, sink));
        self.counter.track()
    }
}

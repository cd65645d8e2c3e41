//! # Callback Registry
//!
//! The client-owned table of handlers awaiting an out-of-band reply.
//!
//! ## Invariants
//!
//! - **Unique Names**: Ids come from a per-registry counter (`scrape_cb_<n>`),
//!   so concurrent calls never share a handler.
//! - **Settle Once**: Each entry holds a single `oneshot::Sender`. Whoever takes
//!   it first (response or load failure) settles the call. Everything after
//!   that is a late delivery and is ignored.
//! - **No Residue**: The entry and its injection live exactly as long as the
//!   `PendingCall` guard. Dropping the guard, on any exit path including a
//!   cancelled caller, removes both.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use scrapewire::WireError;
use scrapewire::script;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::delivery::Injection;

pub const CALLBACK_PREFIX: &str = "scrape_cb_";

/// How a pending call was settled out of band.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// The handler was invoked with this payload.
    Response(Value),
    /// The delivery mechanism could not load.
    LoadFailed(String),
}

struct Entry {
    tx: Option<oneshot::Sender<Settlement>>,
    injection: Option<Box<dyn Injection>>,
}

pub struct CallbackRegistry {
    entries: DashMap<String, Entry>,
    seq_gen: AtomicU64,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            seq_gen: AtomicU64::new(0),
        }
    }

    /// Reserves the next callback name.
    pub fn next_id(&self) -> String {
        let seq = self.seq_gen.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", CALLBACK_PREFIX, seq)
    }

    /// Registers a handler under a fresh name. The returned guard owns the entry.
    pub fn register(self: &Arc<Self>) -> (PendingCall, oneshot::Receiver<Settlement>) {
        let id = self.next_id();
        let (tx, rx) = oneshot::channel();

        self.entries.insert(id.clone(), Entry {
            tx: Some(tx),
            injection: None,
        });

        let pending = PendingCall {
            id,
            registry: self.clone(),
        };
        (pending, rx)
    }

    /// A handle the delivery mechanism uses to reach this registry.
    pub fn sink(self: &Arc<Self>, id: &str) -> CallbackSink {
        CallbackSink {
            id: id.to_string(),
            registry: self.clone(),
        }
    }

    /// Invokes the handler registered under `callback`.
    ///
    /// Returns `false` if no such handler is waiting (unknown, already settled,
    /// or already cleaned up).
    pub fn dispatch(&self, callback: &str, payload: Value) -> bool {
        self.settle(callback, Settlement::Response(payload))
    }

    /// Reports that the delivery for `callback` failed to load.
    pub fn fail(&self, callback: &str, reason: impl Into<String>) -> bool {
        self.settle(callback, Settlement::LoadFailed(reason.into()))
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn has_injection(&self, id: &str) -> bool {
        self.entries
            .get(id)
            .is_some_and(|entry| entry.injection.is_some())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn settle(&self, id: &str, settlement: Settlement) -> bool {
        let tx = match self.entries.get_mut(id) {
            Some(mut entry) => entry.tx.take(),
            None => None,
        };

        let Some(tx) = tx else {
            debug!(callback = %id, "ignoring delivery for settled or unknown callback");
            return false;
        };

        // receiver gone means the caller already gave up; still counts as the settlement
        let _ = tx.send(settlement);
        true
    }

    fn attach(&self, id: &str, injection: Box<dyn Injection>) {
        let orphan = match self.entries.get_mut(id) {
            Some(mut entry) => entry.injection.replace(injection),
            None => Some(injection),
        };
        if let Some(orphan) = orphan {
            orphan.remove();
        }
    }

    fn deregister(&self, id: &str) {
        if let Some((_, entry)) = self.entries.remove(id) {
            if let Some(injection) = entry.injection {
                injection.remove();
            }
        }
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// One in-flight callback attempt. Dropping it deregisters the handler and
/// removes the injection.
pub struct PendingCall {
    id: String,
    registry: Arc<CallbackRegistry>,
}

impl PendingCall {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Hands the delivery artifact to the registry so cleanup can remove it.
    pub fn attach(&self, injection: Box<dyn Injection>) {
        self.registry.attach(&self.id, injection);
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        self.registry.deregister(&self.id);
    }
}

/// The delivery side's view of one pending call.
#[derive(Clone)]
pub struct CallbackSink {
    id: String,
    registry: Arc<CallbackRegistry>,
}

impl CallbackSink {
    /// The callback name the remote side is expected to call.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Invokes this call's handler directly.
    pub fn respond(&self, payload: Value) -> bool {
        self.registry.dispatch(&self.id, payload)
    }

    /// Executes the script loaded for this call.
    ///
    /// The script must call this call's own handler. A script naming any other
    /// handler is rejected and settles nothing.
    pub fn run_script(&self, body: &str) -> Result<bool, WireError> {
        let call = script::parse(body)?;
        if call.callback != self.id {
            return Err(WireError::UnexpectedCallback {
                expected: self.id.clone(),
                found: call.callback,
            });
        }
        Ok(self.respond(call.payload))
    }

    pub fn load_failed(&self, reason: impl Into<String>) -> bool {
        self.registry.fail(&self.id, reason)
    }
}

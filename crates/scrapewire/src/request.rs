//! # Call Requests
//!
//! A `CallRequest` names one remote function and carries a flat payload map.
//! It knows how to put itself on the wire in both endpoint modes.
//!
//! ## Wire Format
//!
//! - **Query**: `function=<name>`, one parameter per payload key, `_t=<nonce>`,
//!   and `callback=<id>` for the callback transport. Strings go out verbatim,
//!   numbers as a browser prints them, other scalars and all objects and
//!   arrays as JSON text.
//! - **Body**: a single JSON document `{ "function": <name>, "data": <payload> }`.
//!
//! Parameters are *set*, not appended: a key already present in the endpoint's
//! own query string is overwritten in place.

use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use serde_json::json;
use url::Url;

use crate::error::Result;
use crate::error::WireError;

pub const FUNCTION_PARAM: &str = "function";
pub const NONCE_PARAM: &str = "_t";
pub const CALLBACK_PARAM: &str = "callback";

/// One invocation of a remote function.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub function: String,
    pub payload: Map<String, Value>,
}

impl CallRequest {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            payload: Map::new(),
        }
    }

    pub fn with_payload(function: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            function: function.into(),
            payload,
        }
    }

    /// Adds a single payload entry.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// The `function` pair followed by one pair per payload key.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.payload.len() + 1);
        pairs.push((FUNCTION_PARAM.to_string(), self.function.clone()));
        for (key, value) in &self.payload {
            pairs.push((key.clone(), param_text(value)));
        }
        pairs
    }

    /// Query-mode URL for the direct transport.
    pub fn to_query_url(&self, endpoint: &Url, nonce: u64) -> Url {
        let mut pairs = self.query_pairs();
        pairs.push((NONCE_PARAM.to_string(), nonce.to_string()));
        set_params(endpoint, pairs)
    }

    /// Query-mode URL for the callback transport.
    pub fn to_callback_url(&self, endpoint: &Url, callback: &str, nonce: u64) -> Url {
        let mut pairs = self.query_pairs();
        pairs.push((CALLBACK_PARAM.to_string(), callback.to_string()));
        pairs.push((NONCE_PARAM.to_string(), nonce.to_string()));
        set_params(endpoint, pairs)
    }

    /// Body-mode document.
    pub fn to_body(&self) -> Value {
        json!({
            "function": self.function,
            "data": Value::Object(self.payload.clone()),
        })
    }
}

/// Text form of a payload value as it appears in a query parameter.
pub fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_text(n),
        other => other.to_string(),
    }
}

/// Numbers print the way a browser's `String(n)` does: an integral float
/// drops its fraction (`1.0` is `1`) and `-0` is `0`.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        _ => n.to_string(),
    }
}

/// Applies `URLSearchParams.set` semantics for each pair, in order.
fn set_params(endpoint: &Url, params: Vec<(String, String)>) -> Url {
    let mut merged: Vec<(String, String)> = endpoint.query_pairs().into_owned().collect();
    for (key, value) in params {
        let mut seen = false;
        merged.retain_mut(|(k, v)| {
            if *k != key {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            *v = value.clone();
            true
        });
        if !seen {
            merged.push((key, value));
        }
    }

    let mut url = endpoint.clone();
    url.query_pairs_mut().clear().extend_pairs(merged);
    url
}

/// A call as the endpoint reads it back off the wire.
///
/// Query-mode arguments arrive as strings; body-mode arguments keep their JSON
/// shape. Used by stub endpoints and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedCall {
    pub function: String,
    pub callback: Option<String>,
    pub nonce: Option<u64>,
    pub args: Map<String, Value>,
}

impl ReceivedCall {
    pub fn from_url(url: &Url) -> Result<Self> {
        let mut function = None;
        let mut callback = None;
        let mut nonce = None;
        let mut args = Map::new();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                FUNCTION_PARAM => function = Some(value.into_owned()),
                CALLBACK_PARAM => callback = Some(value.into_owned()),
                NONCE_PARAM => nonce = value.parse().ok(),
                _ => {
                    args.insert(key.into_owned(), Value::String(value.into_owned()));
                }
            }
        }

        Ok(Self {
            function: function.ok_or(WireError::MissingFunction)?,
            callback,
            nonce,
            args,
        })
    }

    pub fn from_body(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        let Value::Object(mut doc) = value else {
            return Err(WireError::NotAnObject);
        };

        let function = match doc.remove(FUNCTION_PARAM) {
            Some(Value::String(name)) => name,
            _ => return Err(WireError::MissingFunction),
        };
        let args = match doc.remove("data") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Ok(Self {
            function,
            callback: None,
            nonce: None,
            args,
        })
    }

    /// Reads a query argument that was sent as JSON text.
    pub fn structured_arg(&self, key: &str) -> Result<Value> {
        match self.args.get(key) {
            Some(Value::String(text)) => Ok(serde_json::from_str(text)?),
            Some(other) => Ok(other.clone()),
            None => Ok(Value::Null),
        }
    }
}

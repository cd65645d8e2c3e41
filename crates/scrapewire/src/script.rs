//! # Callback Script Framing
//!
//! The callback transport receives executable content instead of a bare body:
//! the JSON envelope wrapped in a call to the registered handler.
//!
//! ```text
//! /**/scrape_cb_7({"success":true,"data":{...}});
//! ```
//!
//! We never execute anything. `parse` recognises exactly this shape and
//! yields the handler name plus the JSON argument.

use serde_json::Value;

use crate::error::Result;
use crate::error::WireError;

/// A decoded `name(payload)` script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptCall {
    pub callback: String,
    pub payload: Value,
}

/// Wraps a payload for the named handler.
pub fn wrap(callback: &str, payload: &Value) -> String {
    format!("{}({})", callback, payload)
}

/// Parses a callback script.
pub fn parse(script: &str) -> Result<ScriptCall> {
    let mut body = script.trim();
    body = body.strip_prefix("/**/").unwrap_or(body).trim_start();
    body = body.strip_suffix(';').unwrap_or(body).trim_end();

    let open = body
        .find('(')
        .ok_or_else(|| WireError::MalformedScript("missing '('".into()))?;
    let inner = body[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| WireError::MalformedScript("missing closing ')'".into()))?;

    let callback = body[..open].trim();
    if !is_valid_name(callback) {
        return Err(WireError::InvalidCallbackName(callback.to_string()));
    }

    let payload = serde_json::from_str(inner.trim())?;
    Ok(ScriptCall {
        callback: callback.to_string(),
        payload,
    })
}

/// Plain identifiers only: `[A-Za-z_$][A-Za-z0-9_$]*`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else { return false };
    let head = first.is_ascii_alphabetic() || first == '_' || first == '$';
    head && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

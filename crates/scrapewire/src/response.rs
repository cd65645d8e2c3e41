//! # Response Envelope
//!
//! Every endpoint reply, on either transport, is the same JSON object:
//!
//! ```text
//! { "success": bool, "data": {...}, "timestamp": <millis|string>, "error": string }
//! ```
//!
//! The envelope is decoded loosely (every field optional) and then split into
//! a `Reply` or an application error message by `Envelope::into_reply`.
//! `success` decides; any body without `"success": true` is a failure.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::error::WireError;

/// Message used when the endpoint does not report success and does not say why.
pub const UNSPECIFIED_FAILURE: &str = "request failed";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl Envelope {
    /// Parses a raw body. Anything other than a JSON object is rejected.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(WireError::NotAnObject);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// The explicit error indicator, if the endpoint set one.
    ///
    /// Follows truthiness: `null`, `false`, `0` and `""` are not errors.
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(other.to_string()),
        }
    }

    /// Splits the envelope into a reply or the endpoint's error message.
    ///
    /// Only an explicit `success: true` is a success. A missing flag counts
    /// as a failure without a message.
    pub fn into_reply(self) -> std::result::Result<Reply, String> {
        if let Some(message) = self.error_message() {
            return Err(message);
        }
        if self.success != Some(true) {
            return Err(UNSPECIFIED_FAILURE.to_string());
        }

        Ok(Reply {
            data: self.data.unwrap_or(Value::Null),
            timestamp: self.timestamp.as_ref().and_then(Timestamp::from_value),
        })
    }
}

/// A successful reply, stripped of its envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub data: Value,
    pub timestamp: Option<Timestamp>,
}

impl Reply {
    /// Typed view of a `scrapeAndSave` payload.
    pub fn scrape_data(&self) -> Result<ScrapeData> {
        Ok(ScrapeData::deserialize(&self.data)?)
    }
}

/// When the endpoint processed the call.
#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    /// Milliseconds since the Unix epoch.
    Millis(i64),
    /// Whatever string the endpoint sent (usually ISO-8601).
    Text(String),
}

impl Timestamp {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(Self::Millis),
            Value::String(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Millis(ms) => write!(f, "{}", ms),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// The `data` object returned by `scrapeAndSave`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeData {
    pub url: String,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub text_preview: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub url: String,
}

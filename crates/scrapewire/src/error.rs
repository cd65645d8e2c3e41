//! # Error Definitions
//!
//! Failures while putting a call on the wire or reading a reply off it.

/// Wire-level failures. None of these involve the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The body was not valid JSON.
    Json(String),
    /// The body parsed, but was not a JSON object.
    NotAnObject,
    /// A received call carried no `function` name.
    MissingFunction,
    /// Callback script framing was not `name(...)`.
    MalformedScript(String),
    /// The callback name is not a plain identifier.
    InvalidCallbackName(String),
    /// The script calls a handler other than the one it was loaded for.
    UnexpectedCallback { expected: String, found: String },
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "invalid JSON: {}", msg),
            Self::NotAnObject => write!(f, "response body is not a JSON object"),
            Self::MissingFunction => write!(f, "call has no function name"),
            Self::MalformedScript(msg) => write!(f, "malformed callback script: {}", msg),
            Self::InvalidCallbackName(name) => write!(f, "invalid callback name '{}'", name),
            Self::UnexpectedCallback { expected, found } => {
                write!(f, "script calls '{}', expected '{}'", found, expected)
            }
        }
    }
}

impl std::error::Error for WireError {}

impl From<serde_json::Error> for WireError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

/// A specialized Result type for wire operations.
pub type Result<T> = std::result::Result<T, WireError>;

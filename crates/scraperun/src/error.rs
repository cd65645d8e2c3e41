//! # Call Errors
//!
//! Every way an `invoke` can fail, before it is flattened into a
//! `CallResult::Failure`.

use crate::transport::TransportError;

pub const NOT_CONFIGURED: &str = "endpoint not configured";
pub const TIMED_OUT: &str = "timeout";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// No endpoint set. Fatal to the call, never retried.
    Configuration(String),
    /// Connectivity, status or parse failure on the direct path.
    Transport(TransportError),
    /// The endpoint explicitly reported failure.
    Application(String),
    /// No settlement within the budget.
    Timeout,
    /// The callback delivery itself could not be loaded.
    TransportLoad(String),
}

impl CallError {
    pub fn not_configured() -> Self {
        Self::Configuration(NOT_CONFIGURED.to_string())
    }

    /// Whether another transport might succeed where this one failed.
    ///
    /// Application errors are deterministic server-side rejections.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "{}", msg),
            Self::Transport(e) => write!(f, "{}", e),
            Self::Application(msg) => write!(f, "{}", msg),
            Self::Timeout => write!(f, "{}", TIMED_OUT),
            Self::TransportLoad(msg) => write!(f, "Callback script failed to load: {}", msg),
        }
    }
}

impl std::error::Error for CallError {}

impl From<TransportError> for CallError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

pub type Result<T> = std::result::Result<T, CallError>;

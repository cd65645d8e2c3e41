//! # Result Normalization
//!
//! Whatever happened on the wire, the caller gets one `CallResult`.

use scrapewire::Reply;
use scrapewire::ScrapeData;
use scrapewire::Timestamp;
use serde_json::Value;

use crate::error::CallError;

/// Which layer produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    Transport,
    Application,
    Timeout,
    TransportLoad,
}

/// The normalized outcome of one `invoke`.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    Success {
        data: Value,
        timestamp: Option<Timestamp>,
    },
    Failure {
        error_message: String,
        kind: FailureKind,
    },
}

impl CallResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error_message, .. } => Some(error_message),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Typed `scrapeAndSave` payload, if this is a success carrying one.
    pub fn scrape_data(&self) -> Option<ScrapeData> {
        match self {
            Self::Success { data, .. } => serde_json::from_value(data.clone()).ok(),
            Self::Failure { .. } => None,
        }
    }
}

impl From<Reply> for CallResult {
    fn from(reply: Reply) -> Self {
        Self::Success {
            data: reply.data,
            timestamp: reply.timestamp,
        }
    }
}

impl From<CallError> for CallResult {
    fn from(e: CallError) -> Self {
        let kind = match &e {
            CallError::Configuration(_) => FailureKind::Configuration,
            CallError::Transport(_) => FailureKind::Transport,
            CallError::Application(_) => FailureKind::Application,
            CallError::Timeout => FailureKind::Timeout,
            CallError::TransportLoad(_) => FailureKind::TransportLoad,
        };
        Self::Failure {
            error_message: e.to_string(),
            kind,
        }
    }
}

impl From<Result<Reply, CallError>> for CallResult {
    fn from(settled: Result<Reply, CallError>) -> Self {
        match settled {
            Ok(reply) => reply.into(),
            Err(e) => e.into(),
        }
    }
}

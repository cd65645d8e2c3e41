//! # Troubleshooting Guidance
//!
//! Presentation helpers layered over a `CallResult::Failure`. The message is
//! classified by pattern, and the classification picks a hint. None of this
//! feeds back into transport decisions.

use crate::outcome::CallResult;

/// Static checklist shown with every failure.
pub const TROUBLESHOOTING: [&str; 3] = [
    "Make sure the Apps Script endpoint URL is correct",
    "Deploy the script as a Web App with access set to \"Anyone\"",
    "Check the Spreadsheet ID configured in the Apps Script code",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    /// The endpoint could not be reached at all.
    Connectivity,
    /// The endpoint answered with an error status.
    HttpStatus,
    /// Nothing came back in time.
    Timeout,
    /// Anything else, usually a message from the endpoint itself.
    Other,
}

impl Diagnosis {
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Connectivity => "The endpoint could not be reached. Check the URL and your network connection.",
            Self::HttpStatus => "The endpoint answered with an error status. Check the deployment and its access settings.",
            Self::Timeout => "The endpoint did not answer in time. It may be overloaded or the target page may be slow.",
            Self::Other => "The endpoint reported an error.",
        }
    }
}

/// Classifies a failure message.
pub fn diagnose(message: &str) -> Diagnosis {
    let lower = message.to_ascii_lowercase();

    if lower.contains("timeout") || lower.contains("timed out") {
        Diagnosis::Timeout
    } else if lower.contains("http error") || lower.contains("status:") {
        Diagnosis::HttpStatus
    } else if ["connection", "failed to fetch", "network", "failed to load", "dns"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        Diagnosis::Connectivity
    } else {
        Diagnosis::Other
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guidance {
    pub diagnosis: Diagnosis,
    pub hint: &'static str,
    pub steps: &'static [&'static str],
}

/// Guidance for a failed result; `None` for a success.
pub fn guidance_for(result: &CallResult) -> Option<Guidance> {
    let diagnosis = diagnose(result.error_message()?);
    Some(Guidance {
        diagnosis,
        hint: diagnosis.hint(),
        steps: &TROUBLESHOOTING,
    })
}

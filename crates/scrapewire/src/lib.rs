//! # ScrapeWire
//!
//! The wire contract between the scrape client and its remote endpoint.
//!
//! ## Philosophy
//!
//! - **No I/O**: This crate builds URLs and bodies and reads envelopes. Moving
//!   bytes is the runtime's job.
//! - **Two Modes, One Envelope**: Requests go out as query parameters or as a
//!   JSON body; replies always come back as the same envelope, bare or wrapped
//!   in a callback script.

pub mod error;
pub mod request;
pub mod response;
pub mod script;

pub use error::Result;
pub use error::WireError;
pub use request::CallRequest;
pub use request::ReceivedCall;
pub use response::Envelope;
pub use response::Link;
pub use response::Reply;
pub use response::ScrapeData;
pub use response::Timestamp;
pub use script::ScriptCall;

#[cfg(test)]
mod tests;

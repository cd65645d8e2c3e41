//! # ScrapeRun
//!
//! A resilient client for the scraper endpoint's remote functions.
//!
//! ## Philosophy
//!
//! - **Always Settles**: `invoke` returns a `CallResult` exactly once, whatever
//!   the network does. Errors never escape as panics or hung futures.
//! - **One Fallback**: A direct request first; if it fails at the transport
//!   level, one callback-script attempt. No retry loops.
//! - **Scoped Cleanup**: Handlers, timers and injected scripts are owned by a
//!   guard and released on every exit path.

pub mod callback;
pub mod client;
pub mod config;
pub mod delivery;
pub mod direct;
pub mod error;
pub mod guidance;
pub mod outcome;
pub mod registry;
pub mod scrape;
pub mod transport;

#[doc(hidden)]
pub mod mock_transport;

pub use client::ClientBuilder;
pub use client::RemoteCallClient;
pub use config::ClientConfig;
pub use config::DirectMode;
pub use config::FallbackPolicy;
pub use error::CallError;
pub use outcome::CallResult;
pub use outcome::FailureKind;
pub use scrape::ScrapeOptions;

//! # Client Configuration
//!
//! Everything a `RemoteCallClient` needs before its first call. Values come
//! from code (`ClientBuilder`), from the environment, or both.
//!
//! | variable               | values                 | default    |
//! |------------------------|------------------------|------------|
//! | `SCRAPER_API_URL`      | absolute http(s) URL   | unset      |
//! | `SCRAPER_TIMEOUT_SECS` | positive integer       | `30`       |
//! | `SCRAPER_DIRECT_MODE`  | `body` \| `query`      | `body`     |
//! | `SCRAPER_FALLBACK`     | `callback` \| `disabled` | `callback` |

use std::str::FromStr;
use std::time::Duration;

use url::Url;

pub const ENV_API_URL: &str = "SCRAPER_API_URL";
pub const ENV_TIMEOUT: &str = "SCRAPER_TIMEOUT_SECS";
pub const ENV_DIRECT_MODE: &str = "SCRAPER_DIRECT_MODE";
pub const ENV_FALLBACK: &str = "SCRAPER_FALLBACK";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The endpoint is not an absolute http(s) URL.
    InvalidEndpoint(String),
    /// An environment value could not be parsed.
    InvalidValue { key: String, value: String },
    /// The default HTTP transport could not be built.
    Http(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEndpoint(raw) => write!(f, "invalid endpoint URL '{}'", raw),
            Self::InvalidValue { key, value } => write!(f, "invalid value '{}' for {}", value, key),
            Self::Http(msg) => write!(f, "HTTP client error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// How the direct transport puts a call on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectMode {
    /// POST `{ "function": .., "data": .. }`.
    #[default]
    Body,
    /// GET with one query parameter per payload key.
    Query,
}

impl FromStr for DirectMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "body" => Ok(Self::Body),
            "query" => Ok(Self::Query),
            _ => Err(ConfigError::InvalidValue {
                key: ENV_DIRECT_MODE.into(),
                value: s.into(),
            }),
        }
    }
}

/// What to do when the direct transport fails at the transport level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Retry once through the callback transport.
    #[default]
    Callback,
    /// Return the direct failure as-is.
    Disabled,
}

impl FromStr for FallbackPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "callback" => Ok(Self::Callback),
            "disabled" | "none" => Ok(Self::Disabled),
            _ => Err(ConfigError::InvalidValue {
                key: ENV_FALLBACK.into(),
                value: s.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub endpoint: Option<Url>,
    /// Budget per transport attempt.
    pub timeout: Duration,
    pub direct_mode: DirectMode,
    pub fallback: FallbackPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: DEFAULT_TIMEOUT,
            direct_mode: DirectMode::default(),
            fallback: FallbackPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Reads the `SCRAPER_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_API_URL) {
            config.endpoint = parse_endpoint(&raw)?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            config.timeout = parse_timeout(&raw)?;
        }
        if let Some(raw) = lookup(ENV_DIRECT_MODE) {
            config.direct_mode = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_FALLBACK) {
            config.fallback = raw.parse()?;
        }

        Ok(config)
    }
}

/// Trims and validates an endpoint. Blank input means "no endpoint".
pub fn parse_endpoint(raw: &str) -> Result<Option<Url>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let url = Url::parse(trimmed).map_err(|_| ConfigError::InvalidEndpoint(trimmed.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(Some(url)),
        _ => Err(ConfigError::InvalidEndpoint(trimmed.to_string())),
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue {
            key: ENV_TIMEOUT.into(),
            value: raw.into(),
        }),
    }
}

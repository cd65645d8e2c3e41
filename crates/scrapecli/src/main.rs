//! # scrape
//!
//! Command-line front end for the scraper endpoint.
//!
//! ```text
//! scrape [--endpoint URL] [--timeout SECS] <url> [--no-title] [--no-meta] [--no-links]
//! scrape [--endpoint URL] ping
//! ```
//!
//! Flags override the `SCRAPER_*` environment variables. Logs go to stderr
//! (filtered by `RUST_LOG`), the rendered result to stdout.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use anyhow::bail;
use clap::Parser;
use clap::Subcommand;
use scraperun::ClientConfig;
use scraperun::DirectMode;
use scraperun::FallbackPolicy;
use scraperun::RemoteCallClient;
use scraperun::ScrapeOptions;
use scraperun::config::parse_endpoint;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

mod render;


#[derive(Debug, Parser)]
#[command(name = "scrape", version, about = "Scrape a page through the scraper endpoint")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Endpoint URL, overriding SCRAPER_API_URL.
    #[arg(long, global = true, value_name = "URL")]
    endpoint: Option<String>,

    /// Budget per transport attempt, in seconds.
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// How the direct request is encoded: `body` or `query`.
    #[arg(long, global = true, value_name = "MODE")]
    direct_mode: Option<DirectMode>,

    /// Never fall back to the callback transport.
    #[arg(long, global = true)]
    no_fallback: bool,

    /// Page to scrape.
    url: Option<String>,

    #[arg(long)]
    no_title: bool,

    #[arg(long)]
    no_meta: bool,

    #[arg(long)]
    no_links: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that the endpoint answers.
    Ping,
}

impl Cli {
    /// Environment configuration with the command-line flags laid over it.
    fn client_config(&self, mut config: ClientConfig) -> anyhow::Result<ClientConfig> {
        if let Some(raw) = &self.endpoint {
            config.endpoint = parse_endpoint(raw)?;
        }
        if let Some(secs) = self.timeout {
            if secs == 0 {
                bail!("--timeout must be at least one second");
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(mode) = self.direct_mode {
            config.direct_mode = mode;
        }
        if self.no_fallback {
            config.fallback = FallbackPolicy::Disabled;
        }
        Ok(config)
    }

    fn options(&self) -> ScrapeOptions {
        ScrapeOptions {
            extract_title: !self.no_title,
            extract_meta: !self.no_meta,
            extract_links: !self.no_links,
        }
    }
}

/// Accepts only absolute `http`/`https` URLs.
fn validate_target(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("'{}' is not a valid URL", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("unsupported scheme '{}', expected http or https", other),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.client_config(ClientConfig::from_env()?)?;
    debug!(?config, "client configured");
    let client = RemoteCallClient::new(config)?;

    if let Some(Command::Ping) = cli.command {
        return Ok(if client.test_connection().await {
            println!("Connection OK");
            ExitCode::SUCCESS
        } else {
            println!("Connection failed");
            ExitCode::FAILURE
        });
    }

    let Some(raw) = cli.url.as_deref() else {
        bail!("missing <url> to scrape (or `ping`)");
    };
    let target = raw.trim();
    validate_target(target)?;

    let result = client.scrape_and_save(target, cli.options()).await;
    print!("{}", render::Report(&result));

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

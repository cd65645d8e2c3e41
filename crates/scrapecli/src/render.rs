//! Plain-text rendering of a `CallResult`.

use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use scraperun::CallResult;
use scraperun::guidance;
use scrapewire::ScrapeData;
use scrapewire::Timestamp;
use serde_json::Value;

/// Links listed before the rest are summarized as a count.
const LINK_PREVIEW: usize = 3;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Displays a result the way the CLI prints it.
pub struct Report<'a>(pub &'a CallResult);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            CallResult::Success { data, timestamp } => {
                writeln!(f, "Scrape succeeded")?;
                match serde_json::from_value::<ScrapeData>(data.clone()) {
                    Ok(scraped) => write_scrape(f, &scraped)?,
                    Err(_) => write_raw(f, data)?,
                }
                if let Some(timestamp) = timestamp {
                    writeln!(f, "  Processed at:     {}", format_timestamp(timestamp))?;
                }
                Ok(())
            }
            CallResult::Failure { error_message, .. } => {
                writeln!(f, "Scrape failed")?;
                writeln!(f, "  Error: {}", error_message)?;
                if let Some(guidance) = guidance::guidance_for(self.0) {
                    writeln!(f, "  {}", guidance.hint)?;
                    writeln!(f)?;
                    writeln!(f, "Troubleshooting:")?;
                    for step in guidance.steps {
                        writeln!(f, "  - {}", step)?;
                    }
                }
                Ok(())
            }
        }
    }
}

fn write_scrape(f: &mut fmt::Formatter<'_>, scraped: &ScrapeData) -> fmt::Result {
    writeln!(f, "  URL:              {}", scraped.url)?;
    writeln!(f, "  HTTP status:      {}", scraped.status_code)?;

    let title = scraped.title.as_deref().filter(|t| !t.is_empty());
    writeln!(f, "  Title:            {}", title.unwrap_or("not found"))?;
    if let Some(meta) = scraped.meta_description.as_deref().filter(|m| !m.is_empty()) {
        writeln!(f, "  Meta description: {}", meta)?;
    }
    writeln!(f, "  Text preview:     {}", scraped.text_preview)?;

    if !scraped.links.is_empty() {
        writeln!(f, "  Links found:      {}", scraped.links.len())?;
        for link in scraped.links.iter().take(LINK_PREVIEW) {
            let text = link.text.as_deref().filter(|t| !t.is_empty()).unwrap_or("No text");
            writeln!(f, "    - {} -> {}", text, link.url)?;
        }
        if scraped.links.len() > LINK_PREVIEW {
            writeln!(f, "    ... and {} more", scraped.links.len() - LINK_PREVIEW)?;
        }
    }
    Ok(())
}

/// Payloads that are not scrape results (e.g. `testConnection`) are shown as JSON.
fn write_raw(f: &mut fmt::Formatter<'_>, data: &Value) -> fmt::Result {
    if data.is_null() {
        return Ok(());
    }
    let pretty = serde_json::to_string_pretty(data).map_err(|_| fmt::Error)?;
    for line in pretty.lines() {
        writeln!(f, "  {}", line)?;
    }
    Ok(())
}

/// Epoch millis and RFC 3339 strings are shown in UTC; anything else verbatim.
pub fn format_timestamp(timestamp: &Timestamp) -> String {
    let parsed = match timestamp {
        Timestamp::Millis(ms) => DateTime::<Utc>::from_timestamp_millis(*ms),
        Timestamp::Text(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
    };
    match parsed {
        Some(time) => time.format(TIME_FORMAT).to_string(),
        None => timestamp.to_string(),
    }
}

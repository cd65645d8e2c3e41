//! Typed payloads for the two remote functions the scraper endpoint exposes.

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

pub const SCRAPE_FUNCTION: &str = "scrapeAndSave";
pub const TEST_CONNECTION_FUNCTION: &str = "testConnection";

/// Which parts of the page the endpoint should extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub extract_title: bool,
    pub extract_meta: bool,
    pub extract_links: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            extract_title: true,
            extract_meta: true,
            extract_links: true,
        }
    }
}

/// `{ url, options }` as `scrapeAndSave` expects it.
pub fn scrape_payload(url: &str, options: ScrapeOptions) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("url".into(), Value::String(url.to_string()));
    payload.insert(
        "options".into(),
        json!({
            "extractTitle": options.extract_title,
            "extractMeta": options.extract_meta,
            "extractLinks": options.extract_links,
        }),
    );
    payload
}

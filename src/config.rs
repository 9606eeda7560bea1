use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// A saved crawl target: a search URL plus optional filter overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyPreset {
    #[serde(default)]
    pub label: String,
    pub url: String,
    #[serde(default)]
    pub query: QueryFilters,
}

/// User-facing filter parameters, mapped onto site query keys by
/// `query::generate_query_url`. All values arrive as strings (presets are
/// hand-written JSON) and are normalized during URL synthesis.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryFilters {
    pub checkin: Option<String>,
    pub checkout: Option<String>,
    pub adults: Option<String>,
    pub bedroom: Option<String>,
    pub bed: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub pool: Option<String>,
    pub waterfront: Option<String>,
}

impl QueryFilters {
    pub fn is_empty(&self) -> bool {
        self.checkin.is_none()
            && self.checkout.is_none()
            && self.adults.is_none()
            && self.bedroom.is_none()
            && self.bed.is_none()
            && self.price_min.is_none()
            && self.price_max.is_none()
            && self.pool.is_none()
            && self.waterfront.is_none()
    }
}

pub fn load_preset(path: &Path) -> Result<PropertyPreset> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read preset {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse preset {}", path.display()))
}

/// Per-invocation crawl parameters handed to a crawler.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub url: String,
    pub page_limit: Option<u32>,
    pub with_price: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_parses_with_partial_query() {
        let preset: PropertyPreset = serde_json::from_str(
            r#"{"label": "kissimmee", "url": "https://www.airbnb.com/s/Kissimmee/homes",
                "query": {"checkin": "2024-05-19", "adults": "4"}}"#,
        )
        .unwrap();
        assert_eq!(preset.label, "kissimmee");
        assert_eq!(preset.query.checkin.as_deref(), Some("2024-05-19"));
        assert!(preset.query.pool.is_none());
    }

    #[test]
    fn preset_query_defaults_to_empty() {
        let preset: PropertyPreset =
            serde_json::from_str(r#"{"url": "https://www.airbnb.com/s/x/homes"}"#).unwrap();
        assert!(preset.query.is_empty());
    }
}

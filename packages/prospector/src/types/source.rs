//! Configured marketplace sources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace platform category for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformCategory {
    Vehicle,
    Residential,
    Commercial,
    General,
    Auction,
}

impl PlatformCategory {
    /// Stable snake_case label, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformCategory::Vehicle => "vehicle",
            PlatformCategory::Residential => "residential",
            PlatformCategory::Commercial => "commercial",
            PlatformCategory::General => "general",
            PlatformCategory::Auction => "auction",
        }
    }

    /// Parse a stored label back into the closed set.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "vehicle" => Some(PlatformCategory::Vehicle),
            "residential" => Some(PlatformCategory::Residential),
            "commercial" => Some(PlatformCategory::Commercial),
            "general" => Some(PlatformCategory::General),
            "auction" => Some(PlatformCategory::Auction),
            _ => None,
        }
    }
}

/// A configured marketplace site to be scraped.
///
/// Read-only to the pipeline except for `last_scraped_at`, which the
/// discovery stage stamps on completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    pub platform_category: PlatformCategory,
    pub base_url: String,
    /// Ordered path suffixes appended to `base_url` for discovery.
    /// An empty string maps the base URL itself.
    pub search_paths: Vec<String>,
    pub is_active: bool,
    /// Free-form cadence label (e.g. "daily"). Scheduling is the caller's
    /// concern; the pipeline only carries it.
    pub scrape_frequency: String,
    pub last_scraped_at: Option<DateTime<Utc>>,
}

impl Source {
    /// Create an active source with a single search path (the base URL).
    pub fn new(
        name: impl Into<String>,
        platform_category: PlatformCategory,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            platform_category,
            base_url: base_url.into(),
            search_paths: vec![String::new()],
            is_active: true,
            scrape_frequency: "daily".to_string(),
            last_scraped_at: None,
        }
    }

    /// Replace the search path suffixes.
    pub fn with_search_paths(mut self, paths: Vec<String>) -> Self {
        self.search_paths = paths;
        self
    }

    /// Set the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// The full URLs to map, one per search path.
    pub fn search_urls(&self) -> Vec<String> {
        self.search_paths
            .iter()
            .map(|path| format!("{}{}", self.base_url, path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_urls_append_suffixes() {
        let source = Source::new("S1", PlatformCategory::General, "https://example.test")
            .with_search_paths(vec![String::new(), "/listings".to_string()]);

        assert_eq!(
            source.search_urls(),
            vec![
                "https://example.test".to_string(),
                "https://example.test/listings".to_string()
            ]
        );
    }

    #[test]
    fn test_platform_category_round_trip() {
        let json = serde_json::to_string(&PlatformCategory::Vehicle).unwrap();
        assert_eq!(json, "\"vehicle\"");
        let back: PlatformCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PlatformCategory::Vehicle);
    }
}

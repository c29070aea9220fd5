//! Raw listings discovered for later enrichment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::source::{PlatformCategory, Source};

/// Discovery-time metadata attached to a raw listing.
///
/// Stored as free-form JSON so that later enrichment can recover the
/// originating source name and platform category even if the source row
/// has since changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryData {
    pub url: String,
    pub source: String,
    pub platform_category: PlatformCategory,
}

impl DiscoveryData {
    /// Capture discovery metadata for a URL found under `source`.
    pub fn capture(url: impl Into<String>, source: &Source) -> Self {
        Self {
            url: url.into(),
            source: source.name.clone(),
            platform_category: source.platform_category,
        }
    }

    /// Best-effort read back from stored JSON.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// A raw listing to be inserted by the discovery stage.
#[derive(Debug, Clone)]
pub struct NewRawListing {
    pub job_id: Uuid,
    pub source_url: String,
    pub discovery_data: serde_json::Value,
}

/// A discovered candidate URL awaiting or having undergone enrichment.
///
/// `processed` flips `false -> true` at most once; once true, `parsed_data`
/// and `opportunity_id` are immutable. Rows are never deleted by the
/// pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListing {
    pub id: Uuid,
    pub job_id: Uuid,
    pub source_url: String,
    pub discovery_data: serde_json::Value,
    pub processed: bool,
    pub parsed_data: Option<serde_json::Value>,
    pub opportunity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl RawListing {
    /// The platform category recorded at discovery time, if readable.
    pub fn platform_category(&self) -> Option<PlatformCategory> {
        DiscoveryData::from_value(&self.discovery_data).map(|d| d.platform_category)
    }

    /// The source name recorded at discovery time.
    pub fn source_platform(&self) -> String {
        DiscoveryData::from_value(&self.discovery_data)
            .map(|d| d.source)
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_data_survives_round_trip() {
        let source = Source::new("Jiji", PlatformCategory::Vehicle, "https://jiji.test");
        let data = DiscoveryData::capture("https://jiji.test/car/44", &source);
        let value = serde_json::to_value(&data).unwrap();

        let back = DiscoveryData::from_value(&value).unwrap();
        assert_eq!(back.source, "Jiji");
        assert_eq!(back.platform_category, PlatformCategory::Vehicle);
    }

    #[test]
    fn test_malformed_discovery_data_degrades() {
        let listing = RawListing {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            source_url: "https://example.test/listing/1".to_string(),
            discovery_data: serde_json::json!({"unexpected": true}),
            processed: false,
            parsed_data: None,
            opportunity_id: None,
            created_at: Utc::now(),
        };

        assert_eq!(listing.platform_category(), None);
        assert_eq!(listing.source_platform(), "Unknown");
    }
}

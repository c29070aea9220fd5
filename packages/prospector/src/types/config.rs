//! Pipeline configuration.

use serde::{Deserialize, Serialize};

/// Locale hints forwarded to the content retrieval client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationHint {
    /// ISO country code (e.g. "KE")
    pub country: String,
    /// Preferred content languages, in order
    pub languages: Vec<String>,
}

impl Default for LocationHint {
    fn default() -> Self {
        Self {
            country: "KE".to_string(),
            languages: vec!["en".to_string(), "sw".to_string()],
        }
    }
}

/// Tunables for the enrichment stage.
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Listing content is truncated to this many characters before it is
    /// embedded in the inference prompt, bounding request cost.
    pub content_limit: usize,

    /// Number of regional pricing rows sampled as calibration context.
    pub pricing_sample: usize,

    /// Number of listings enriched concurrently within one batch.
    pub concurrency: usize,

    /// County attributed to a listing when extraction yields none.
    pub default_county: String,

    /// Currency label used in the inference prompt.
    pub currency: String,

    /// Locale hints for content retrieval.
    pub location: Option<LocationHint>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            content_limit: 4000,
            pricing_sample: 20,
            concurrency: 4,
            default_county: "Nairobi".to_string(),
            currency: "KES".to_string(),
            location: Some(LocationHint::default()),
        }
    }
}

impl EnrichmentConfig {
    /// Set the content truncation bound.
    pub fn with_content_limit(mut self, chars: usize) -> Self {
        self.content_limit = chars;
        self
    }

    /// Set the pricing sample size.
    pub fn with_pricing_sample(mut self, rows: usize) -> Self {
        self.pricing_sample = rows;
        self
    }

    /// Set the worker count for one batch.
    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers.max(1);
        self
    }

    /// Set the fallback county.
    pub fn with_default_county(mut self, county: impl Into<String>) -> Self {
        self.default_county = county.into();
        self
    }

    /// Set the prompt currency.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Set or clear retrieval locale hints.
    pub fn with_location(mut self, location: Option<LocationHint>) -> Self {
        self.location = location;
        self
    }
}

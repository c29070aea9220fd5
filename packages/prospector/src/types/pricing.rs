//! Regional pricing reference data.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::opportunity::AssetType;

/// Aggregate price statistics for one county/asset-type bucket.
///
/// Read-only calibration context for the inference prompt; never mutated
/// by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionalPricing {
    pub id: Uuid,
    pub county: String,
    pub city: Option<String>,
    pub district: Option<String>,
    pub asset_type: AssetType,
    pub average_price: f64,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sample_size: Option<i32>,
}

impl RegionalPricing {
    /// Reference row with just the fields the prompt needs.
    pub fn new(county: impl Into<String>, asset_type: AssetType, average_price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            county: county.into(),
            city: None,
            district: None,
            asset_type,
            average_price,
            min_price: None,
            max_price: None,
            sample_size: None,
        }
    }

    /// Set the min/max band.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min_price = Some(min);
        self.max_price = Some(max);
        self
    }

    /// Set the sample size.
    pub fn with_sample_size(mut self, n: i32) -> Self {
        self.sample_size = Some(n);
        self
    }
}

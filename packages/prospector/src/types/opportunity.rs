//! Materialized valuation opportunities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::source::PlatformCategory;

/// Asset class of an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Vehicle,
    Residential,
    Commercial,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Vehicle => "vehicle",
            AssetType::Residential => "residential",
            AssetType::Commercial => "commercial",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "vehicle" => Some(AssetType::Vehicle),
            "residential" => Some(AssetType::Residential),
            "commercial" => Some(AssetType::Commercial),
            _ => None,
        }
    }

    /// Fallback mapping from the discovery-time platform category, used
    /// when extraction does not yield an asset type. `general` and
    /// `auction` platforms degrade to `residential`.
    pub fn from_platform(category: PlatformCategory) -> Self {
        match category {
            PlatformCategory::Vehicle => AssetType::Vehicle,
            PlatformCategory::Commercial => AssetType::Commercial,
            PlatformCategory::Residential
            | PlatformCategory::General
            | PlatformCategory::Auction => AssetType::Residential,
        }
    }
}

/// Lifecycle status of an opportunity. The pipeline only ever writes `New`;
/// the remaining states belong to downstream deal tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStatus {
    New,
    Contacted,
    Negotiating,
    Closed,
    Dismissed,
}

impl OpportunityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityStatus::New => "new",
            OpportunityStatus::Contacted => "contacted",
            OpportunityStatus::Negotiating => "negotiating",
            OpportunityStatus::Closed => "closed",
            OpportunityStatus::Dismissed => "dismissed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(OpportunityStatus::New),
            "contacted" => Some(OpportunityStatus::Contacted),
            "negotiating" => Some(OpportunityStatus::Negotiating),
            "closed" => Some(OpportunityStatus::Closed),
            "dismissed" => Some(OpportunityStatus::Dismissed),
            _ => None,
        }
    }
}

/// Priority of an improvement recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// A single improvement suggested by the inference service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementRecommendation {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_cost: f64,
    #[serde(default)]
    pub potential_value_add: f64,
    #[serde(default)]
    pub priority: Priority,
}

/// A materialized, valuation-scored listing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: Uuid,
    pub asset_type: AssetType,
    pub title: String,
    pub description: Option<String>,
    pub listed_price: f64,
    pub estimated_value: f64,
    /// `estimated_value - listed_price`
    pub profit_potential: f64,
    /// `profit_potential / listed_price * 100`, zero when `listed_price` is zero
    pub profit_percentage: f64,
    pub county: String,
    pub city: Option<String>,
    pub district: Option<String>,
    pub seller_name: Option<String>,
    pub seller_contact: Option<String>,
    pub source_url: String,
    pub source_platform: String,
    pub ai_confidence_score: f64,
    pub improvement_recommendations: Vec<ImprovementRecommendation>,
    /// Sum of recommendation costs.
    pub improvement_cost_estimate: f64,
    /// `profit_potential - improvement_cost_estimate`
    pub net_profit_potential: f64,
    pub status: OpportunityStatus,
    pub scraped_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_fallback_mapping() {
        assert_eq!(
            AssetType::from_platform(PlatformCategory::Vehicle),
            AssetType::Vehicle
        );
        assert_eq!(
            AssetType::from_platform(PlatformCategory::Commercial),
            AssetType::Commercial
        );
        assert_eq!(
            AssetType::from_platform(PlatformCategory::General),
            AssetType::Residential
        );
        assert_eq!(
            AssetType::from_platform(PlatformCategory::Auction),
            AssetType::Residential
        );
    }

    #[test]
    fn test_recommendation_defaults_on_sparse_json() {
        let rec: ImprovementRecommendation =
            serde_json::from_str(r#"{"item": "Repaint"}"#).unwrap();
        assert_eq!(rec.item, "Repaint");
        assert_eq!(rec.estimated_cost, 0.0);
        assert_eq!(rec.priority, Priority::Medium);
    }
}

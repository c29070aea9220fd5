//! Defensive parsing of inference responses and derived-metric computation.
//!
//! The inference service returns untrusted, possibly malformed JSON. Every
//! field is optional here and every consumer supplies a default, so the
//! downstream opportunity construction never branches on absence.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::traits::fetcher::FetchedPage;
use crate::types::config::EnrichmentConfig;
use crate::types::listing::RawListing;
use crate::types::opportunity::{
    AssetType, ImprovementRecommendation, Opportunity, OpportunityStatus,
};
use crate::types::source::PlatformCategory;

/// Best-effort structured view of one inference response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingAnalysis {
    #[serde(default)]
    pub asset_type: Option<AssetType>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub listed_price: Option<f64>,
    #[serde(default)]
    pub estimated_value: Option<f64>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub seller_name: Option<String>,
    #[serde(default)]
    pub seller_contact: Option<String>,
    #[serde(default)]
    pub ai_confidence_score: Option<f64>,
    #[serde(default)]
    pub improvement_recommendations: Option<Vec<ImprovementRecommendation>>,
}

/// Parse a raw model response into an analysis, tolerating malformed input.
///
/// Returns `None` when the text is not a JSON object at all; unknown and
/// mistyped fields inside an otherwise-valid object degrade to `None`
/// field-by-field rather than rejecting the whole response.
pub fn parse_analysis(text: &str) -> Option<ListingAnalysis> {
    let trimmed = strip_code_fences(text.trim());

    let value: serde_json::Value = serde_json::from_str(trimmed).ok()?;
    if !value.is_object() {
        return None;
    }

    // Field-level tolerance: pull each field out individually so one bad
    // field (e.g. a string price) cannot sink the rest.
    let obj = value.as_object()?;
    Some(ListingAnalysis {
        asset_type: obj
            .get("asset_type")
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
        title: string_field(obj, "title"),
        description: string_field(obj, "description"),
        listed_price: number_field(obj, "listed_price"),
        estimated_value: number_field(obj, "estimated_value"),
        county: string_field(obj, "county"),
        city: string_field(obj, "city"),
        district: string_field(obj, "district"),
        seller_name: string_field(obj, "seller_name"),
        seller_contact: string_field(obj, "seller_contact"),
        ai_confidence_score: number_field(obj, "ai_confidence_score"),
        improvement_recommendations: obj
            .get("improvement_recommendations")
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
    })
}

/// Models wrap JSON in markdown fences often enough to be worth stripping.
fn strip_code_fences(text: &str) -> &str {
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn string_field(
    obj: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Option<String> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn number_field(obj: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(|v| v.as_f64())
}

/// Profit metrics derived from listed price and estimated value.
///
/// `profit_potential = estimated_value - listed_price`;
/// `profit_percentage = profit_potential / listed_price * 100`, zero when
/// the listed price is zero or negative (never a division by zero).
pub fn profit_metrics(listed_price: f64, estimated_value: f64) -> (f64, f64) {
    let profit_potential = estimated_value - listed_price;
    let profit_percentage = if listed_price > 0.0 {
        profit_potential / listed_price * 100.0
    } else {
        0.0
    };
    (profit_potential, profit_percentage)
}

/// Materialize an opportunity from a (possibly absent) analysis.
///
/// Defensive defaults when extraction is missing or degraded: asset type
/// from the discovery-time platform category, title from page metadata,
/// description from the leading page content, county from configuration,
/// confidence 50, no recommendations.
pub fn build_opportunity(
    id: Uuid,
    listing: &RawListing,
    page: &FetchedPage,
    analysis: Option<&ListingAnalysis>,
    config: &EnrichmentConfig,
) -> Opportunity {
    let platform = listing
        .platform_category()
        .unwrap_or(PlatformCategory::Residential);

    let listed_price = analysis
        .and_then(|a| a.listed_price)
        .filter(|p| *p > 0.0)
        .unwrap_or(0.0);
    let estimated_value = analysis
        .and_then(|a| a.estimated_value)
        .unwrap_or(listed_price);

    let (profit_potential, profit_percentage) = profit_metrics(listed_price, estimated_value);

    let recommendations = analysis
        .and_then(|a| a.improvement_recommendations.clone())
        .unwrap_or_default();
    let improvement_cost_estimate: f64 =
        recommendations.iter().map(|rec| rec.estimated_cost).sum();

    let title = analysis
        .and_then(|a| a.title.clone())
        .or_else(|| page.title.clone())
        .unwrap_or_else(|| "Untitled Listing".to_string());

    let description = analysis
        .and_then(|a| a.description.clone())
        .or_else(|| {
            let head = page.content_head(500);
            (!head.is_empty()).then(|| head.to_string())
        });

    let now = Utc::now();

    Opportunity {
        id,
        asset_type: analysis
            .and_then(|a| a.asset_type)
            .unwrap_or_else(|| AssetType::from_platform(platform)),
        title,
        description,
        listed_price,
        estimated_value,
        profit_potential,
        profit_percentage,
        county: analysis
            .and_then(|a| a.county.clone())
            .unwrap_or_else(|| config.default_county.clone()),
        city: analysis.and_then(|a| a.city.clone()),
        district: analysis.and_then(|a| a.district.clone()),
        seller_name: analysis.and_then(|a| a.seller_name.clone()),
        seller_contact: analysis.and_then(|a| a.seller_contact.clone()),
        source_url: listing.source_url.clone(),
        source_platform: listing.source_platform(),
        ai_confidence_score: analysis.and_then(|a| a.ai_confidence_score).unwrap_or(50.0),
        improvement_recommendations: recommendations,
        improvement_cost_estimate,
        net_profit_potential: profit_potential - improvement_cost_estimate,
        status: OpportunityStatus::New,
        scraped_at: now,
        created_at: now,
    }
}

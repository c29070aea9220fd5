//! Inference prompt construction.

use crate::types::config::EnrichmentConfig;
use crate::types::pricing::RegionalPricing;

/// Build the extraction prompt for one listing.
///
/// `content` must already be truncated to the configured bound; regional
/// pricing rows are embedded as calibration context so estimates land in
/// locally realistic ranges.
pub fn build_analysis_prompt(
    content: &str,
    pricing: &[RegionalPricing],
    config: &EnrichmentConfig,
) -> String {
    let pricing_context: Vec<serde_json::Value> = pricing
        .iter()
        .map(|row| {
            serde_json::json!({
                "county": row.county,
                "asset_type": row.asset_type,
                "average_price": row.average_price,
                "min_price": row.min_price,
                "max_price": row.max_price,
            })
        })
        .collect();

    format!(
        r#"You are a real estate and vehicle market expert. Analyze this listing and extract structured data.

LISTING CONTENT:
{content}

REGIONAL PRICING DATA (for reference):
{pricing}

Extract and return a JSON object with these fields:
{{
  "asset_type": "vehicle" | "residential" | "commercial",
  "title": "listing title",
  "description": "brief description",
  "listed_price": number in {currency},
  "estimated_value": number in {currency} (your estimate of true market value),
  "county": "county name",
  "city": "city/town name or null",
  "seller_name": "seller name or null",
  "seller_contact": "phone/email or null",
  "ai_confidence_score": 0-100,
  "improvement_recommendations": [
    {{"item": "improvement name", "description": "what to do", "estimated_cost": number, "potential_value_add": number, "priority": "low"|"medium"|"high"}}
  ]
}}

If you cannot extract the price, use 0. If location is unclear, default to "{county}".
Return ONLY the JSON object, no other text."#,
        content = content,
        pricing = serde_json::to_string_pretty(&pricing_context).unwrap_or_else(|_| "[]".into()),
        currency = config.currency,
        county = config.default_county,
    )
}

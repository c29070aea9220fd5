//! Enrichment stage: turn unprocessed raw listings into opportunities.

use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::pipeline::analysis::{build_opportunity, parse_analysis, ListingAnalysis};
use crate::pipeline::prompts::build_analysis_prompt;
use crate::traits::analyst::ListingAnalyst;
use crate::traits::fetcher::{FetchRequest, PageFetcher};
use crate::traits::store::ProspectStore;
use crate::types::config::EnrichmentConfig;
use crate::types::listing::RawListing;
use crate::types::pricing::RegionalPricing;

/// An enrichment invocation: how many unprocessed listings to take.
#[derive(Debug, Clone)]
pub struct EnrichmentRequest {
    pub batch_size: usize,
}

impl EnrichmentRequest {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }
}

/// One successfully enriched listing.
#[derive(Debug, Clone)]
pub struct EnrichedItem {
    pub listing_id: Uuid,
    pub opportunity_id: Uuid,
    pub title: String,
}

/// Summary of one enrichment invocation.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentRunResult {
    /// Count of listings fully processed this invocation.
    pub processed: usize,

    /// Per-item results, in completion order.
    pub items: Vec<EnrichedItem>,
}

/// Run the enrichment stage.
///
/// Selects up to `batch_size` unprocessed raw listings (insertion order)
/// and enriches each independently: fetch content, run inference with
/// regional pricing context, compute metrics, claim the listing and insert
/// the opportunity. A failing item is logged and skipped; it stays
/// unprocessed and is retried naturally on the next run. Only failures to
/// read the queue or the pricing reference abort the invocation.
pub async fn run_enrichment<S, F, A>(
    store: &S,
    fetcher: &F,
    analyst: &A,
    config: &EnrichmentConfig,
    request: &EnrichmentRequest,
) -> Result<EnrichmentRunResult>
where
    S: ProspectStore,
    F: PageFetcher,
    A: ListingAnalyst,
{
    let listings = store.unprocessed_listings(request.batch_size).await?;

    if listings.is_empty() {
        info!("No unprocessed listings found");
        return Ok(EnrichmentRunResult::default());
    }

    let pricing = store.regional_pricing_sample(config.pricing_sample).await?;

    info!(count = listings.len(), "Processing listings");

    let items: Vec<EnrichedItem> = stream::iter(listings)
        .map(|listing| {
            let pricing = &pricing;
            async move { enrich_listing(store, fetcher, analyst, config, pricing, listing).await }
        })
        .buffer_unordered(config.concurrency)
        .filter_map(|outcome| async move { outcome })
        .collect()
        .await;

    info!(processed = items.len(), "Enrichment complete");

    Ok(EnrichmentRunResult {
        processed: items.len(),
        items,
    })
}

/// Enrich one listing. Returns `None` on any failure; the listing is left
/// unprocessed (or, for a lost claim, already owned by another worker) and
/// no partial state is written.
async fn enrich_listing<S, F, A>(
    store: &S,
    fetcher: &F,
    analyst: &A,
    config: &EnrichmentConfig,
    pricing: &[RegionalPricing],
    listing: RawListing,
) -> Option<EnrichedItem>
where
    S: ProspectStore,
    F: PageFetcher,
    A: ListingAnalyst,
{
    // 1. Fetch content. A failed fetch skips the item outright.
    let mut fetch_request = FetchRequest::markdown(&listing.source_url);
    if let Some(location) = &config.location {
        fetch_request = fetch_request.with_location(location.clone());
    }

    let page = match fetcher.fetch_page(&fetch_request).await {
        Ok(page) => page,
        Err(e) => {
            warn!(url = %listing.source_url, error = %e, "Failed to fetch listing");
            return None;
        }
    };

    // 2-3. Run inference over the truncated content. Failures and
    // unparseable responses degrade to defensive defaults.
    let prompt = build_analysis_prompt(page.content_head(config.content_limit), pricing, config);

    let analysis: Option<ListingAnalysis> = match analyst.analyze(&prompt).await {
        Ok(text) => {
            let parsed = parse_analysis(&text);
            if parsed.is_none() {
                warn!(url = %listing.source_url, "Inference response was not a JSON object");
            }
            parsed
        }
        Err(e) => {
            warn!(url = %listing.source_url, error = %e, "Inference call failed");
            None
        }
    };

    // 4. Compute derived metrics and materialize the opportunity.
    let opportunity_id = Uuid::new_v4();
    let opportunity =
        build_opportunity(opportunity_id, &listing, &page, analysis.as_ref(), config);

    let parsed_data = match &analysis {
        Some(a) => serde_json::to_value(a).unwrap_or(serde_json::Value::Null),
        None => serde_json::Value::Null,
    };

    // 5. Claim before insert: the conditional update is the concurrency
    // gate, so a listing enriched by a parallel invocation is detected
    // here and produces no second opportunity.
    match store
        .claim_listing(listing.id, &parsed_data, opportunity_id)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            warn!(listing_id = %listing.id, "Listing already claimed by another worker");
            return None;
        }
        Err(e) => {
            warn!(listing_id = %listing.id, error = %e, "Failed to claim listing");
            return None;
        }
    }

    if let Err(e) = store.insert_opportunity(&opportunity).await {
        warn!(listing_id = %listing.id, error = %e, "Failed to insert opportunity");
        return None;
    }

    if let Err(e) = store.increment_job_processed(listing.job_id).await {
        warn!(job_id = %listing.job_id, error = %e, "Failed to increment job counter");
    }

    Some(EnrichedItem {
        listing_id: listing.id,
        opportunity_id,
        title: opportunity.title,
    })
}

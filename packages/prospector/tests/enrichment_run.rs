//! Integration tests for the enrichment stage.
//!
//! Drive `run_enrichment` over the in-memory store and mock fetcher/analyst,
//! verifying metric computation, defensive defaults, per-item isolation and
//! claim idempotence.

use prospector::testing::{MockAnalyst, MockFetcher, MockMapper};
use prospector::{
    run_discovery, run_enrichment, AssetType, DiscoveryRequest, EnrichmentConfig,
    EnrichmentRequest, MemoryStore, OpportunityStatus, PlatformCategory, RegionalPricing, Source,
};

/// Seed one source and discover `urls` under it, returning the job id.
async fn discover(store: &MemoryStore, platform: PlatformCategory, urls: Vec<&str>) -> uuid::Uuid {
    let source = Source::new("TestSource", platform, "https://example.test");
    store.add_source(source);

    let mapper = MockMapper::new().with_links("https://example.test", urls);
    let result = run_discovery(store, &mapper, &DiscoveryRequest::all(50))
        .await
        .unwrap();
    result.sources[0].job_id
}

#[tokio::test]
async fn test_enrichment_materializes_opportunity() {
    let store = MemoryStore::new();
    let job_id = discover(
        &store,
        PlatformCategory::Residential,
        vec!["https://example.test/house/5"],
    )
    .await;

    store.add_pricing(
        RegionalPricing::new("Nairobi", AssetType::Residential, 8_000_000.0)
            .with_range(2_000_000.0, 30_000_000.0)
            .with_sample_size(120),
    );

    let fetcher = MockFetcher::new().with_page(
        "https://example.test/house/5",
        "# 3BR Maisonette in Kiambu\nAsking 4M, needs a new roof.",
        Some("3BR Maisonette"),
    );
    let analyst = MockAnalyst::new().with_response(
        r#"{
            "asset_type": "residential",
            "title": "3BR Maisonette, Kiambu",
            "description": "Solid maisonette needing roof work",
            "listed_price": 4000000,
            "estimated_value": 5000000,
            "county": "Kiambu",
            "city": "Ruiru",
            "seller_name": "J. Mwangi",
            "seller_contact": "+254700000000",
            "ai_confidence_score": 82,
            "improvement_recommendations": [
                {"item": "Roof", "description": "Replace roofing sheets", "estimated_cost": 250000, "potential_value_add": 500000, "priority": "high"}
            ]
        }"#,
    );

    let result = run_enrichment(
        &store,
        &fetcher,
        &analyst,
        &EnrichmentConfig::default(),
        &EnrichmentRequest::new(10),
    )
    .await
    .unwrap();

    assert_eq!(result.processed, 1);
    assert_eq!(result.items[0].title, "3BR Maisonette, Kiambu");

    // The opportunity carries the computed metrics.
    let opportunities = store.opportunities();
    assert_eq!(opportunities.len(), 1);
    let opportunity = &opportunities[0];
    assert_eq!(opportunity.id, result.items[0].opportunity_id);
    assert_eq!(opportunity.asset_type, AssetType::Residential);
    assert_eq!(opportunity.listed_price, 4_000_000.0);
    assert_eq!(opportunity.estimated_value, 5_000_000.0);
    assert_eq!(opportunity.profit_potential, 1_000_000.0);
    assert_eq!(opportunity.profit_percentage, 25.0);
    assert_eq!(opportunity.improvement_cost_estimate, 250_000.0);
    assert_eq!(opportunity.net_profit_potential, 750_000.0);
    assert_eq!(opportunity.county, "Kiambu");
    assert_eq!(opportunity.status, OpportunityStatus::New);
    assert_eq!(opportunity.source_platform, "TestSource");
    assert_eq!(opportunity.ai_confidence_score, 82.0);

    // The raw listing flipped processed and carries the links.
    let listing = &store.listings()[0];
    assert!(listing.processed);
    assert_eq!(listing.opportunity_id, Some(opportunity.id));
    assert!(listing.parsed_data.is_some());

    // The owning job's processed counter advanced, within items_found.
    let job = store.job(job_id).unwrap();
    assert_eq!(job.items_processed, 1);
    assert!(job.items_processed <= job.items_found);

    // The prompt embedded page content and pricing context.
    let prompts = analyst.calls();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("3BR Maisonette in Kiambu"));
    assert!(prompts[0].contains("Nairobi"));
}

#[tokio::test]
async fn test_fetch_failure_leaves_listing_unprocessed() {
    // Scenario: retrieval fails for the only listing in the batch.
    let store = MemoryStore::new();
    let job_id = discover(
        &store,
        PlatformCategory::Vehicle,
        vec!["https://example.test/car/44"],
    )
    .await;

    let fetcher = MockFetcher::new().with_failure("https://example.test/car/44");
    let analyst = MockAnalyst::new();

    let result = run_enrichment(
        &store,
        &fetcher,
        &analyst,
        &EnrichmentConfig::default(),
        &EnrichmentRequest::new(1),
    )
    .await
    .unwrap();

    assert_eq!(result.processed, 0);
    assert!(result.items.is_empty());
    assert_eq!(store.opportunity_count(), 0);

    let listing = &store.listings()[0];
    assert!(!listing.processed);
    assert!(listing.opportunity_id.is_none());
    assert!(listing.parsed_data.is_none());

    // No inference call was made and no progress was counted.
    assert!(analyst.calls().is_empty());
    assert_eq!(store.job(job_id).unwrap().items_processed, 0);
}

#[tokio::test]
async fn test_zero_listed_price_yields_zero_percentage() {
    // Scenario: inference prices the listing at zero.
    let store = MemoryStore::new();
    discover(
        &store,
        PlatformCategory::Residential,
        vec!["https://example.test/listing/7"],
    )
    .await;

    let fetcher = MockFetcher::new().with_page(
        "https://example.test/listing/7",
        "Inherited plot, price on enquiry.",
        None,
    );
    let analyst = MockAnalyst::new().with_response(
        r#"{"title": "Plot for transfer", "listed_price": 0, "estimated_value": 500000}"#,
    );

    let result = run_enrichment(
        &store,
        &fetcher,
        &analyst,
        &EnrichmentConfig::default(),
        &EnrichmentRequest::new(10),
    )
    .await
    .unwrap();

    assert_eq!(result.processed, 1);
    let opportunity = &store.opportunities()[0];
    assert_eq!(opportunity.listed_price, 0.0);
    assert_eq!(opportunity.profit_potential, 500_000.0);
    assert_eq!(opportunity.profit_percentage, 0.0);
    assert!(opportunity.profit_percentage.is_finite());
}

#[tokio::test]
async fn test_malformed_inference_degrades_to_defaults() {
    // Scenario: the model replies with prose instead of JSON.
    let store = MemoryStore::new();
    discover(
        &store,
        PlatformCategory::Vehicle,
        vec!["https://example.test/vehicle/3"],
    )
    .await;

    let fetcher = MockFetcher::new().with_page(
        "https://example.test/vehicle/3",
        "2014 Probox, quick sale.",
        Some("2014 Probox"),
    );
    let analyst =
        MockAnalyst::new().with_response("Sorry, I was unable to analyze this listing.");

    let result = run_enrichment(
        &store,
        &fetcher,
        &analyst,
        &EnrichmentConfig::default(),
        &EnrichmentRequest::new(10),
    )
    .await
    .unwrap();

    // A degraded opportunity is still created.
    assert_eq!(result.processed, 1);
    let opportunity = &store.opportunities()[0];
    assert_eq!(opportunity.asset_type, AssetType::Vehicle);
    assert_eq!(opportunity.title, "2014 Probox");
    assert_eq!(opportunity.county, "Nairobi");
    assert_eq!(opportunity.ai_confidence_score, 50.0);
    assert!(opportunity.improvement_recommendations.is_empty());
    assert_eq!(opportunity.improvement_cost_estimate, 0.0);
    assert_eq!(opportunity.net_profit_potential, opportunity.profit_potential);
}

#[tokio::test]
async fn test_inference_call_failure_still_creates_opportunity() {
    let store = MemoryStore::new();
    discover(
        &store,
        PlatformCategory::Commercial,
        vec!["https://example.test/property/12"],
    )
    .await;

    let fetcher = MockFetcher::new().with_page(
        "https://example.test/property/12",
        "Go-down to let in Industrial Area.",
        None,
    );
    let analyst = MockAnalyst::new().with_failure();

    let result = run_enrichment(
        &store,
        &fetcher,
        &analyst,
        &EnrichmentConfig::default(),
        &EnrichmentRequest::new(10),
    )
    .await
    .unwrap();

    assert_eq!(result.processed, 1);
    let opportunity = &store.opportunities()[0];
    assert_eq!(opportunity.asset_type, AssetType::Commercial);
    assert_eq!(opportunity.title, "Untitled Listing");
    assert_eq!(
        opportunity.description.as_deref(),
        Some("Go-down to let in Industrial Area.")
    );
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let store = MemoryStore::new();
    discover(
        &store,
        PlatformCategory::Residential,
        vec!["https://example.test/house/1"],
    )
    .await;

    let fetcher = MockFetcher::new().with_page("https://example.test/house/1", "A house.", None);
    let analyst = MockAnalyst::new().with_response(r#"{"title": "House"}"#);
    let config = EnrichmentConfig::default();

    let first = run_enrichment(&store, &fetcher, &analyst, &config, &EnrichmentRequest::new(10))
        .await
        .unwrap();
    let second = run_enrichment(&store, &fetcher, &analyst, &config, &EnrichmentRequest::new(10))
        .await
        .unwrap();

    assert_eq!(first.processed, 1);
    assert_eq!(second.processed, 0);
    assert_eq!(store.opportunity_count(), 1);
    // Only the first run fetched anything.
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn test_batch_size_bounds_the_run() {
    let store = MemoryStore::new();
    let job_id = discover(
        &store,
        PlatformCategory::Residential,
        vec![
            "https://example.test/listing/1",
            "https://example.test/listing/2",
            "https://example.test/listing/3",
        ],
    )
    .await;

    let fetcher = MockFetcher::new()
        .with_page("https://example.test/listing/1", "one", None)
        .with_page("https://example.test/listing/2", "two", None)
        .with_page("https://example.test/listing/3", "three", None);
    let analyst = MockAnalyst::new().with_response(r#"{"title": "Listing"}"#);

    let result = run_enrichment(
        &store,
        &fetcher,
        &analyst,
        &EnrichmentConfig::default(),
        &EnrichmentRequest::new(2),
    )
    .await
    .unwrap();

    assert_eq!(result.processed, 2);
    assert_eq!(store.job(job_id).unwrap().items_processed, 2);
    assert_eq!(
        store.listings().iter().filter(|l| !l.processed).count(),
        1
    );
}

#[tokio::test]
async fn test_one_bad_item_does_not_sink_the_batch() {
    let store = MemoryStore::new();
    let job_id = discover(
        &store,
        PlatformCategory::Vehicle,
        vec![
            "https://example.test/car/1",
            "https://example.test/car/2",
        ],
    )
    .await;

    let fetcher = MockFetcher::new()
        .with_failure("https://example.test/car/1")
        .with_page("https://example.test/car/2", "Clean 2018 Demio.", None);
    let analyst = MockAnalyst::new().with_response(r#"{"title": "Demio"}"#);

    let result = run_enrichment(
        &store,
        &fetcher,
        &analyst,
        &EnrichmentConfig::default(),
        &EnrichmentRequest::new(10),
    )
    .await
    .unwrap();

    assert_eq!(result.processed, 1);
    assert_eq!(result.items[0].title, "Demio");

    let listings = store.listings();
    assert!(!listings[0].processed);
    assert!(listings[1].processed);
    assert_eq!(store.job(job_id).unwrap().items_processed, 1);
}

#[tokio::test]
async fn test_concurrent_runs_enrich_each_listing_once() {
    // Two enrichment invocations racing over the same unprocessed row:
    // the conditional claim lets exactly one of them materialize the
    // opportunity.
    let store = MemoryStore::new();
    let job_id = discover(
        &store,
        PlatformCategory::Residential,
        vec!["https://example.test/house/42"],
    )
    .await;

    let fetcher = MockFetcher::new().with_page("https://example.test/house/42", "A house.", None);
    let analyst = MockAnalyst::new().with_response(r#"{"title": "House 42"}"#);
    let config = EnrichmentConfig::default();

    let req_a = EnrichmentRequest::new(1);
    let req_b = EnrichmentRequest::new(1);
    let (first, second) = tokio::join!(
        run_enrichment(&store, &fetcher, &analyst, &config, &req_a),
        run_enrichment(&store, &fetcher, &analyst, &config, &req_b),
    );

    let total = first.unwrap().processed + second.unwrap().processed;
    assert_eq!(total, 1);
    assert_eq!(store.opportunity_count(), 1);
    assert_eq!(store.job(job_id).unwrap().items_processed, 1);

    let listing = &store.listings()[0];
    assert!(listing.processed);
    assert_eq!(
        listing.opportunity_id,
        Some(store.opportunities()[0].id)
    );
}

#[tokio::test]
async fn test_content_truncation_bounds_the_prompt() {
    let store = MemoryStore::new();
    discover(
        &store,
        PlatformCategory::Residential,
        vec!["https://example.test/listing/9"],
    )
    .await;

    let long_content = "x".repeat(10_000);
    let fetcher =
        MockFetcher::new().with_page("https://example.test/listing/9", &long_content, None);
    let analyst = MockAnalyst::new().with_response(r#"{"title": "Long"}"#);

    let config = EnrichmentConfig::default().with_content_limit(100);
    run_enrichment(&store, &fetcher, &analyst, &config, &EnrichmentRequest::new(1))
        .await
        .unwrap();

    let prompt = &analyst.calls()[0];
    assert!(prompt.contains(&"x".repeat(100)));
    assert!(!prompt.contains(&"x".repeat(101)));
}

//! Marketplace Listing Discovery and Valuation Pipeline
//!
//! A two-phase batch pipeline that turns third-party marketplace listings
//! (vehicles, residential and commercial property) into valuation
//! opportunities with computed profit metrics:
//!
//! 1. **Discovery** maps each configured source site, filters the links
//!    through a listing-URL heuristic, and persists candidate URLs as
//!    unprocessed raw listings under a per-source job.
//! 2. **Enrichment** fetches each unprocessed listing's content, runs an
//!    inference service over it with regional pricing context, computes
//!    profit metrics, and materializes an opportunity record.
//!
//! Both stages recover locally from per-source and per-item failures: a
//! failed source marks its job `failed` and the run continues; a failed
//! item stays unprocessed and is retried on the next run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use prospector::{
//!     run_discovery, run_enrichment, DiscoveryRequest, EnrichmentConfig,
//!     EnrichmentRequest, FirecrawlClient, OpenAiAnalyst, PostgresStore,
//!     ValidatedFetcher,
//! };
//!
//! let store = PostgresStore::new(&database_url).await?;
//! let firecrawl = FirecrawlClient::from_env()?;
//! let analyst = OpenAiAnalyst::from_env()?;
//!
//! let discovered = run_discovery(&store, &firecrawl, &DiscoveryRequest::all(50)).await?;
//!
//! let fetcher = ValidatedFetcher::new(FirecrawlClient::from_env()?);
//! let enriched = run_enrichment(
//!     &store,
//!     &fetcher,
//!     &analyst,
//!     &EnrichmentConfig::default(),
//!     &EnrichmentRequest::new(10),
//! )
//! .await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (store, mapper, fetcher, analyst)
//! - [`types`] - Domain types (sources, jobs, listings, opportunities)
//! - [`pipeline`] - The discovery and enrichment stages
//! - [`clients`] - Production clients (Firecrawl, OpenAI-compatible)
//! - [`stores`] - Storage implementations (memory, Postgres)
//! - [`security`] - Credential handling and SSRF protection
//! - [`testing`] - Mock implementations for testing

pub mod clients;
pub mod error;
pub mod pipeline;
pub mod security;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ClientError, PipelineError, SecurityError};
pub use traits::{
    analyst::ListingAnalyst,
    fetcher::{FetchRequest, FetchedPage, PageFetcher, ValidatedFetcher},
    mapper::{MapRequest, SiteMapper},
    store::ProspectStore,
};
pub use types::{
    AssetType, DiscoveryData, EnrichmentConfig, ImprovementRecommendation, Job, JobStatus,
    LocationHint, NewRawListing, Opportunity, OpportunityStatus, PlatformCategory, Priority,
    RawListing, RegionalPricing, Source,
};

// Re-export pipeline entry points and results
pub use pipeline::{
    build_analysis_prompt, build_opportunity, is_listing_url, parse_analysis, profit_metrics,
    run_discovery, run_enrichment, DiscoveryRequest, DiscoveryRunResult, EnrichedItem,
    EnrichmentRequest, EnrichmentRunResult, ListingAnalysis, SourceOutcome,
};

// Re-export clients
pub use clients::{FirecrawlClient, OpenAiAnalyst};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;

// Re-export security utilities
pub use security::{ApiCredentials, UrlValidator};

//! The two-phase ingestion-and-enrichment pipeline.

pub mod analysis;
pub mod classifier;
pub mod discovery;
pub mod enrichment;
pub mod prompts;

pub use analysis::{build_opportunity, parse_analysis, profit_metrics, ListingAnalysis};
pub use classifier::is_listing_url;
pub use discovery::{run_discovery, DiscoveryRequest, DiscoveryRunResult, SourceOutcome};
pub use enrichment::{run_enrichment, EnrichedItem, EnrichmentRequest, EnrichmentRunResult};
pub use prompts::build_analysis_prompt;

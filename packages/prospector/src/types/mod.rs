//! Domain types for the prospecting pipeline.

pub mod config;
pub mod job;
pub mod listing;
pub mod opportunity;
pub mod pricing;
pub mod source;

pub use config::{EnrichmentConfig, LocationHint};
pub use job::{Job, JobStatus};
pub use listing::{DiscoveryData, NewRawListing, RawListing};
pub use opportunity::{
    AssetType, ImprovementRecommendation, Opportunity, OpportunityStatus, Priority,
};
pub use pricing::RegionalPricing;
pub use source::{PlatformCategory, Source};

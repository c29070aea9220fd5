//! Persistent store abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::types::{Job, NewRawListing, Opportunity, RawListing, RegionalPricing, Source};

/// Persistence seam for the pipeline.
///
/// Implementations: `MemoryStore` (tests/development) and `PostgresStore`
/// (`postgres` cargo feature).
///
/// Two operations carry the pipeline's concurrency contract:
///
/// - `increment_job_processed` must be an atomic increment, safe against
///   concurrent enrichment workers and invocations in other processes.
/// - `claim_listing` must be a conditional update guarded on
///   `processed = false`, returning whether this caller won the claim.
#[async_trait]
pub trait ProspectStore: Send + Sync {
    /// Active sources, optionally narrowed to one id.
    ///
    /// An inactive source is never returned, even when requested by id.
    async fn active_sources(&self, source_id: Option<Uuid>) -> Result<Vec<Source>>;

    /// Stamp a source's last-scraped timestamp.
    async fn touch_source(&self, source_id: Uuid, at: DateTime<Utc>) -> Result<()>;

    /// Persist a new job (created in `Running` state by the discovery stage).
    async fn create_job(&self, job: &Job) -> Result<()>;

    /// Transition a job `running -> completed`, fixing `items_found`.
    ///
    /// Rejects the call with `PipelineError::InvalidTransition` if the job
    /// is not currently `running`.
    async fn complete_job(&self, job_id: Uuid, items_found: i32) -> Result<()>;

    /// Transition a job `running -> failed`, capturing the error message.
    async fn fail_job(&self, job_id: Uuid, error_message: &str) -> Result<()>;

    /// Atomically increment a job's `items_processed` counter by one.
    async fn increment_job_processed(&self, job_id: Uuid) -> Result<()>;

    /// Bulk-insert raw listings, returning the number inserted.
    async fn insert_raw_listings(&self, listings: &[NewRawListing]) -> Result<usize>;

    /// Up to `limit` unprocessed raw listings in insertion order.
    async fn unprocessed_listings(&self, limit: usize) -> Result<Vec<RawListing>>;

    /// Claim a raw listing for enrichment: conditionally set
    /// `processed = true` and attach `parsed_data` and `opportunity_id`,
    /// guarded on the row still being `processed = false`.
    ///
    /// Returns `true` if this caller performed the transition, `false` if
    /// another worker already had.
    async fn claim_listing(
        &self,
        listing_id: Uuid,
        parsed_data: &serde_json::Value,
        opportunity_id: Uuid,
    ) -> Result<bool>;

    /// Insert a materialized opportunity.
    async fn insert_opportunity(&self, opportunity: &Opportunity) -> Result<()>;

    /// Up to `limit` regional pricing rows for prompt calibration.
    async fn regional_pricing_sample(&self, limit: usize) -> Result<Vec<RegionalPricing>>;
}

//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::traits::store::ProspectStore;
use crate::types::{Job, NewRawListing, Opportunity, RawListing, RegionalPricing, Source};

/// In-memory store for sources, jobs, listings and opportunities.
///
/// Useful for testing and development. Not suitable for production as
/// data is lost on restart; the claim/increment guarantees hold only
/// within one process.
#[derive(Default)]
pub struct MemoryStore {
    sources: RwLock<Vec<Source>>,
    jobs: RwLock<HashMap<Uuid, Job>>,
    raw_listings: RwLock<Vec<RawListing>>,
    opportunities: RwLock<Vec<Opportunity>>,
    pricing: RwLock<Vec<RegionalPricing>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a source.
    pub fn add_source(&self, source: Source) {
        self.sources.write().unwrap().push(source);
    }

    /// Seed a regional pricing row.
    pub fn add_pricing(&self, row: RegionalPricing) {
        self.pricing.write().unwrap().push(row);
    }

    /// Read a job back.
    pub fn job(&self, job_id: Uuid) -> Option<Job> {
        self.jobs.read().unwrap().get(&job_id).cloned()
    }

    /// Read a raw listing back.
    pub fn listing(&self, listing_id: Uuid) -> Option<RawListing> {
        self.raw_listings
            .read()
            .unwrap()
            .iter()
            .find(|l| l.id == listing_id)
            .cloned()
    }

    /// All raw listings, in insertion order.
    pub fn listings(&self) -> Vec<RawListing> {
        self.raw_listings.read().unwrap().clone()
    }

    /// All opportunities, in insertion order.
    pub fn opportunities(&self) -> Vec<Opportunity> {
        self.opportunities.read().unwrap().clone()
    }

    /// Number of stored raw listings.
    pub fn listing_count(&self) -> usize {
        self.raw_listings.read().unwrap().len()
    }

    /// Number of stored opportunities.
    pub fn opportunity_count(&self) -> usize {
        self.opportunities.read().unwrap().len()
    }
}

#[async_trait]
impl ProspectStore for MemoryStore {
    async fn active_sources(&self, source_id: Option<Uuid>) -> Result<Vec<Source>> {
        Ok(self
            .sources
            .read()
            .unwrap()
            .iter()
            .filter(|s| s.is_active)
            .filter(|s| source_id.map_or(true, |id| s.id == id))
            .cloned()
            .collect())
    }

    async fn touch_source(&self, source_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut sources = self.sources.write().unwrap();
        let source = sources
            .iter_mut()
            .find(|s| s.id == source_id)
            .ok_or_else(|| PipelineError::NotFound(format!("source {source_id}")))?;
        source.last_scraped_at = Some(at);
        Ok(())
    }

    async fn create_job(&self, job: &Job) -> Result<()> {
        self.jobs.write().unwrap().insert(job.id, job.clone());
        Ok(())
    }

    async fn complete_job(&self, job_id: Uuid, items_found: i32) -> Result<()> {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| PipelineError::NotFound(format!("job {job_id}")))?;

        if !job.status.can_transition(crate::types::JobStatus::Completed) {
            return Err(PipelineError::InvalidTransition {
                from: job.status,
                to: crate::types::JobStatus::Completed,
            });
        }

        job.status = crate::types::JobStatus::Completed;
        job.completed_at = Some(Utc::now());
        job.items_found = items_found;
        Ok(())
    }

    async fn fail_job(&self, job_id: Uuid, error_message: &str) -> Result<()> {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| PipelineError::NotFound(format!("job {job_id}")))?;

        if !job.status.can_transition(crate::types::JobStatus::Failed) {
            return Err(PipelineError::InvalidTransition {
                from: job.status,
                to: crate::types::JobStatus::Failed,
            });
        }

        job.status = crate::types::JobStatus::Failed;
        job.completed_at = Some(Utc::now());
        job.error_message = Some(error_message.to_string());
        Ok(())
    }

    async fn increment_job_processed(&self, job_id: Uuid) -> Result<()> {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| PipelineError::NotFound(format!("job {job_id}")))?;
        job.items_processed += 1;
        Ok(())
    }

    async fn insert_raw_listings(&self, listings: &[NewRawListing]) -> Result<usize> {
        let mut stored = self.raw_listings.write().unwrap();
        for listing in listings {
            stored.push(RawListing {
                id: Uuid::new_v4(),
                job_id: listing.job_id,
                source_url: listing.source_url.clone(),
                discovery_data: listing.discovery_data.clone(),
                processed: false,
                parsed_data: None,
                opportunity_id: None,
                created_at: Utc::now(),
            });
        }
        Ok(listings.len())
    }

    async fn unprocessed_listings(&self, limit: usize) -> Result<Vec<RawListing>> {
        Ok(self
            .raw_listings
            .read()
            .unwrap()
            .iter()
            .filter(|l| !l.processed)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn claim_listing(
        &self,
        listing_id: Uuid,
        parsed_data: &serde_json::Value,
        opportunity_id: Uuid,
    ) -> Result<bool> {
        // The write lock makes the check-and-set atomic within the process,
        // mirroring the conditional update a relational store performs.
        let mut stored = self.raw_listings.write().unwrap();
        let listing = stored
            .iter_mut()
            .find(|l| l.id == listing_id)
            .ok_or_else(|| PipelineError::NotFound(format!("raw listing {listing_id}")))?;

        if listing.processed {
            return Ok(false);
        }

        listing.processed = true;
        listing.parsed_data = Some(parsed_data.clone());
        listing.opportunity_id = Some(opportunity_id);
        Ok(true)
    }

    async fn insert_opportunity(&self, opportunity: &Opportunity) -> Result<()> {
        self.opportunities.write().unwrap().push(opportunity.clone());
        Ok(())
    }

    async fn regional_pricing_sample(&self, limit: usize) -> Result<Vec<RegionalPricing>> {
        Ok(self
            .pricing
            .read()
            .unwrap()
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JobStatus, PlatformCategory};

    #[tokio::test]
    async fn test_inactive_source_never_returned() {
        let store = MemoryStore::new();
        let inactive = Source::new("Dormant", PlatformCategory::General, "https://d.test")
            .with_active(false);
        let inactive_id = inactive.id;
        store.add_source(inactive);

        assert!(store.active_sources(None).await.unwrap().is_empty());
        // Even when requested by id.
        assert!(store
            .active_sources(Some(inactive_id))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_complete_job_fixes_items_found() {
        let store = MemoryStore::new();
        let job = Job::start(Uuid::new_v4());
        store.create_job(&job).await.unwrap();

        store.complete_job(job.id, 7).await.unwrap();

        let stored = store.job(job.id).unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.items_found, 7);
        assert!(stored.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_terminal_job_rejects_further_transitions() {
        let store = MemoryStore::new();
        let job = Job::start(Uuid::new_v4());
        store.create_job(&job).await.unwrap();
        store.complete_job(job.id, 1).await.unwrap();

        let err = store.fail_job(job.id, "late failure").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidTransition {
                from: JobStatus::Completed,
                to: JobStatus::Failed,
            }
        ));
    }

    #[tokio::test]
    async fn test_claim_is_one_shot() {
        let store = MemoryStore::new();
        store
            .insert_raw_listings(&[NewRawListing {
                job_id: Uuid::new_v4(),
                source_url: "https://example.test/listing/1".to_string(),
                discovery_data: serde_json::Value::Null,
            }])
            .await
            .unwrap();

        let listing_id = store.listings()[0].id;
        let opportunity_id = Uuid::new_v4();

        assert!(store
            .claim_listing(listing_id, &serde_json::Value::Null, opportunity_id)
            .await
            .unwrap());
        assert!(!store
            .claim_listing(listing_id, &serde_json::Value::Null, Uuid::new_v4())
            .await
            .unwrap());

        let listing = store.listing(listing_id).unwrap();
        assert!(listing.processed);
        assert_eq!(listing.opportunity_id, Some(opportunity_id));
    }

    #[tokio::test]
    async fn test_unprocessed_selection_is_insertion_ordered() {
        let store = MemoryStore::new();
        let job_id = Uuid::new_v4();
        let listings: Vec<NewRawListing> = (0..3)
            .map(|i| NewRawListing {
                job_id,
                source_url: format!("https://example.test/listing/{i}"),
                discovery_data: serde_json::Value::Null,
            })
            .collect();
        store.insert_raw_listings(&listings).await.unwrap();

        let batch = store.unprocessed_listings(2).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].source_url, "https://example.test/listing/0");
        assert_eq!(batch[1].source_url, "https://example.test/listing/1");
    }
}

//! Discovery stage: map configured sources into raw listings.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ClientError, Result};
use crate::pipeline::classifier::is_listing_url;
use crate::traits::mapper::{MapRequest, SiteMapper};
use crate::traits::store::ProspectStore;
use crate::types::job::{Job, JobStatus};
use crate::types::listing::{DiscoveryData, NewRawListing};
use crate::types::source::Source;

/// Per-path mapper requests never ask for more than this many links.
const MAP_LIMIT_CAP: usize = 100;

/// A discovery invocation: which sources, and how many URLs per source.
#[derive(Debug, Clone)]
pub struct DiscoveryRequest {
    /// Restrict the run to one source; `None` runs every active source.
    pub source_id: Option<Uuid>,

    /// Per-source cap on accepted URLs.
    pub limit: usize,
}

impl DiscoveryRequest {
    /// Run all active sources with the given per-source cap.
    pub fn all(limit: usize) -> Self {
        Self {
            source_id: None,
            limit,
        }
    }

    /// Run a single source.
    pub fn for_source(source_id: Uuid, limit: usize) -> Self {
        Self {
            source_id: Some(source_id),
            limit,
        }
    }
}

/// Outcome of discovery for one source.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub job_id: Uuid,
    pub source: String,
    pub status: JobStatus,
    pub urls_found: usize,
    pub error: Option<String>,
}

/// Summary of one discovery invocation.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryRunResult {
    pub sources: Vec<SourceOutcome>,
}

impl DiscoveryRunResult {
    /// Total accepted URLs across all sources.
    pub fn total_urls(&self) -> usize {
        self.sources.iter().map(|s| s.urls_found).sum()
    }

    /// Whether every source in the run completed.
    pub fn is_success(&self) -> bool {
        self.sources
            .iter()
            .all(|s| s.status == JobStatus::Completed)
    }
}

/// Run the discovery stage.
///
/// For every matching active source: create a job, map each configured
/// search path, classify and cap the links, bulk-insert raw listings,
/// complete the job and stamp the source. A failing source marks its job
/// `failed` and the run moves on; only store-level failures around job
/// bookkeeping abort the invocation.
pub async fn run_discovery<S, M>(
    store: &S,
    mapper: &M,
    request: &DiscoveryRequest,
) -> Result<DiscoveryRunResult>
where
    S: ProspectStore,
    M: SiteMapper,
{
    let sources = store.active_sources(request.source_id).await?;

    if sources.is_empty() {
        info!("No active sources found");
        return Ok(DiscoveryRunResult::default());
    }

    let mut result = DiscoveryRunResult::default();

    for source in &sources {
        info!(source = %source.name, "Processing source");

        let job = Job::start(source.id);
        store.create_job(&job).await?;

        match discover_source(store, mapper, source, &job, request.limit).await {
            Ok(accepted) => {
                store.complete_job(job.id, accepted as i32).await?;
                store.touch_source(source.id, Utc::now()).await?;

                info!(
                    source = %source.name,
                    urls_found = accepted,
                    "Discovery completed"
                );

                result.sources.push(SourceOutcome {
                    job_id: job.id,
                    source: source.name.clone(),
                    status: JobStatus::Completed,
                    urls_found: accepted,
                    error: None,
                });
            }
            Err(e) => {
                let message = e.to_string();
                warn!(source = %source.name, error = %message, "Discovery failed");
                store.fail_job(job.id, &message).await?;

                result.sources.push(SourceOutcome {
                    job_id: job.id,
                    source: source.name.clone(),
                    status: JobStatus::Failed,
                    urls_found: 0,
                    error: Some(message),
                });
            }
        }
    }

    Ok(result)
}

/// Map, classify and persist listings for one source. Any error here fails
/// the source's job; the caller keeps the run going.
async fn discover_source<S, M>(
    store: &S,
    mapper: &M,
    source: &Source,
    job: &Job,
    limit: usize,
) -> std::result::Result<usize, DiscoverSourceError>
where
    S: ProspectStore,
    M: SiteMapper,
{
    let mut all_links: Vec<String> = Vec::new();

    for url in source.search_urls() {
        let request = MapRequest::new(&url, limit.min(MAP_LIMIT_CAP));
        let mut links = mapper.map_site(&request).await?;
        links.truncate(limit);
        all_links.extend(links);
    }

    let accepted: Vec<String> = all_links
        .into_iter()
        .filter(|url| is_listing_url(url))
        .take(limit)
        .collect();

    info!(
        source = %source.name,
        candidates = accepted.len(),
        "Found potential listings"
    );

    if !accepted.is_empty() {
        let listings: Vec<NewRawListing> = accepted
            .iter()
            .map(|url| NewRawListing {
                job_id: job.id,
                source_url: url.clone(),
                discovery_data: serde_json::to_value(DiscoveryData::capture(url, source))
                    .unwrap_or_default(),
            })
            .collect();

        store.insert_raw_listings(&listings).await?;
    }

    Ok(accepted.len())
}

/// Failure inside one source's discovery, converted to the job's error
/// message.
#[derive(Debug, thiserror::Error)]
enum DiscoverSourceError {
    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("{0}")]
    Store(#[from] crate::error::PipelineError),
}

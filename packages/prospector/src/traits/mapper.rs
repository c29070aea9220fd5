//! Site mapping (link discovery) abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;

/// A request to map a site into a bounded list of links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapRequest {
    /// Page to map (base URL plus search-path suffix).
    pub url: String,

    /// Optional search filter applied server-side by the mapping service.
    pub search: Option<String>,

    /// Upper bound on returned links.
    pub limit: usize,

    /// Whether links on sibling subdomains count.
    pub include_subdomains: bool,
}

impl MapRequest {
    /// Map `url` returning at most `limit` links, same-domain only.
    pub fn new(url: impl Into<String>, limit: usize) -> Self {
        Self {
            url: url.into(),
            search: None,
            limit,
            include_subdomains: false,
        }
    }

    /// Set a search filter.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Include subdomain links.
    pub fn include_subdomains(mut self) -> Self {
        self.include_subdomains = true;
        self
    }
}

/// Wraps an external "map a site" capability: given a URL, returns a
/// bounded list of links found on or under it.
#[async_trait]
pub trait SiteMapper: Send + Sync {
    /// Discover links for the request, at most `request.limit` of them.
    async fn map_site(&self, request: &MapRequest) -> ClientResult<Vec<String>>;

    /// Mapper name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

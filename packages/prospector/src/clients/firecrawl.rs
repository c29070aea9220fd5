//! Firecrawl-backed site mapper and page fetcher.
//!
//! One client implements both discovery (`POST /v1/map`) and retrieval
//! (`POST /v1/scrape`). Firecrawl handles JavaScript rendering, anti-bot
//! protection and markdown conversion, so the pipeline never parses HTML.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ClientError, ClientResult, PipelineError};
use crate::security::ApiCredentials;
use crate::traits::fetcher::{FetchRequest, FetchedPage, PageFetcher};
use crate::traits::mapper::{MapRequest, SiteMapper};
use crate::types::config::LocationHint;

const FIRECRAWL_API_URL: &str = "https://api.firecrawl.dev/v1";

/// Firecrawl API client.
///
/// # Example
///
/// ```rust,ignore
/// use prospector::clients::FirecrawlClient;
/// use prospector::ValidatedFetcher;
///
/// let client = FirecrawlClient::from_env()?;
/// let fetcher = ValidatedFetcher::new(client);
/// ```
pub struct FirecrawlClient {
    client: Client,
    credentials: ApiCredentials,
    base_url: String,
}

// Wire types for the Firecrawl API.

#[derive(Serialize)]
struct MapApiRequest {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
    limit: u32,
    #[serde(rename = "includeSubdomains")]
    include_subdomains: bool,
}

#[derive(Deserialize)]
struct MapApiResponse {
    success: bool,
    links: Option<Vec<String>>,
    error: Option<String>,
}

#[derive(Serialize)]
struct ScrapeApiRequest {
    url: String,
    formats: Vec<String>,
    #[serde(rename = "onlyMainContent")]
    only_main_content: bool,
    #[serde(rename = "waitFor", skip_serializing_if = "Option::is_none")]
    wait_for: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<LocationHint>,
}

#[derive(Deserialize)]
struct ScrapeApiResponse {
    success: bool,
    data: Option<ScrapeData>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ScrapeData {
    markdown: Option<String>,
    metadata: Option<PageMetadata>,
}

#[derive(Deserialize)]
struct PageMetadata {
    title: Option<String>,
}

impl FirecrawlClient {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> ClientResult<Self> {
        Self::with_credentials(ApiCredentials::new(api_key))
    }

    /// Create a client from explicit credentials.
    pub fn with_credentials(credentials: ApiCredentials) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ClientError::Http(Box::new(e)))?;

        let base_url = credentials
            .base_url
            .clone()
            .unwrap_or_else(|| FIRECRAWL_API_URL.to_string());

        Ok(Self {
            client,
            credentials,
            base_url,
        })
    }

    /// Create from environment variable `FIRECRAWL_API_KEY`.
    pub fn from_env() -> Result<Self, PipelineError> {
        let credentials = ApiCredentials::from_env("FIRECRAWL_API_KEY")?;
        Self::with_credentials(credentials)
            .map_err(|e| PipelineError::Config(format!("firecrawl client: {e}")))
    }

    /// Set the request timeout (seconds).
    pub fn with_timeout(mut self, secs: u64) -> ClientResult<Self> {
        self.client = Client::builder()
            .timeout(Duration::from_secs(secs))
            .build()
            .map_err(|e| ClientError::Http(Box::new(e)))?;
        Ok(self)
    }

    async fn post<T: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: &T,
        url_for_errors: &str,
    ) -> ClientResult<R> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.credentials.api_key.expose()),
            )
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout {
                        url: url_for_errors.to_string(),
                    }
                } else {
                    ClientError::Http(Box::new(e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, message });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Http(Box::new(e)))
    }
}

#[async_trait]
impl SiteMapper for FirecrawlClient {
    async fn map_site(&self, request: &MapRequest) -> ClientResult<Vec<String>> {
        tracing::debug!(url = %request.url, limit = request.limit, "Mapping site");

        let api_request = MapApiRequest {
            url: request.url.clone(),
            search: request.search.clone(),
            limit: request.limit.min(u32::MAX as usize) as u32,
            include_subdomains: request.include_subdomains,
        };

        let response: MapApiResponse = self.post("/map", &api_request, &request.url).await?;

        if !response.success {
            return Err(ClientError::Api {
                status: 200,
                message: response
                    .error
                    .unwrap_or_else(|| "map request failed".to_string()),
            });
        }

        let mut links = response.links.unwrap_or_default();
        links.truncate(request.limit);
        Ok(links)
    }

    fn name(&self) -> &str {
        "firecrawl"
    }
}

#[async_trait]
impl PageFetcher for FirecrawlClient {
    async fn fetch_page(&self, request: &FetchRequest) -> ClientResult<FetchedPage> {
        tracing::debug!(url = %request.url, "Scraping page");

        let api_request = ScrapeApiRequest {
            url: request.url.clone(),
            formats: request.formats.clone(),
            only_main_content: request.only_main_content,
            wait_for: request.wait_for,
            location: request.location.clone(),
        };

        let response: ScrapeApiResponse = self.post("/scrape", &api_request, &request.url).await?;

        if !response.success {
            return Err(ClientError::Api {
                status: 200,
                message: response
                    .error
                    .unwrap_or_else(|| "scrape request failed".to_string()),
            });
        }

        let data = response.data.ok_or_else(|| ClientError::MissingContent {
            url: request.url.clone(),
        })?;

        let markdown = data.markdown.ok_or_else(|| ClientError::MissingContent {
            url: request.url.clone(),
        })?;

        Ok(FetchedPage {
            markdown,
            title: data.metadata.and_then(|m| m.title),
        })
    }

    fn name(&self) -> &str {
        "firecrawl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client() {
        let client = FirecrawlClient::new("test-key").unwrap();
        assert_eq!(SiteMapper::name(&client), "firecrawl");
        assert_eq!(client.base_url, FIRECRAWL_API_URL);
    }

    #[test]
    fn test_base_url_override() {
        let credentials =
            ApiCredentials::new("test-key").with_base_url("https://firecrawl.internal/v1");
        let client = FirecrawlClient::with_credentials(credentials).unwrap();
        assert_eq!(client.base_url, "https://firecrawl.internal/v1");
    }

    #[test]
    fn test_map_request_serializes_wire_casing() {
        let api_request = MapApiRequest {
            url: "https://example.test".to_string(),
            search: None,
            limit: 50,
            include_subdomains: false,
        };
        let json = serde_json::to_string(&api_request).unwrap();
        assert!(json.contains("\"includeSubdomains\":false"));
        assert!(!json.contains("search"));
    }

    #[test]
    fn test_scrape_request_serializes_wire_casing() {
        let api_request = ScrapeApiRequest {
            url: "https://example.test/listing/1".to_string(),
            formats: vec!["markdown".to_string()],
            only_main_content: true,
            wait_for: Some(2000),
            location: Some(LocationHint::default()),
        };
        let json = serde_json::to_string(&api_request).unwrap();
        assert!(json.contains("\"onlyMainContent\":true"));
        assert!(json.contains("\"waitFor\":2000"));
        assert!(json.contains("\"country\":\"KE\""));
    }
}

//! Page content retrieval abstraction, with SSRF-validated wrapper.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::security::UrlValidator;
use crate::types::config::LocationHint;

/// A request to fetch one listing page as cleaned text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,

    /// Desired content formats; the pipeline always asks for markdown.
    pub formats: Vec<String>,

    /// Strip navigation/boilerplate, keeping the listing body.
    pub only_main_content: bool,

    /// Optional wait (ms) for JavaScript-heavy pages before capture.
    pub wait_for: Option<u32>,

    /// Locale hints for geo-fenced marketplaces.
    pub location: Option<LocationHint>,
}

impl FetchRequest {
    /// Markdown request with boilerplate stripped, the pipeline default.
    pub fn markdown(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            formats: vec!["markdown".to_string()],
            only_main_content: true,
            wait_for: None,
            location: None,
        }
    }

    /// Set a pre-capture wait in milliseconds.
    pub fn with_wait_for(mut self, ms: u32) -> Self {
        self.wait_for = Some(ms);
        self
    }

    /// Set locale hints.
    pub fn with_location(mut self, location: LocationHint) -> Self {
        self.location = Some(location);
        self
    }
}

/// Normalized page content plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedPage {
    pub markdown: String,
    pub title: Option<String>,
}

impl FetchedPage {
    /// The leading `limit` characters of the content, on a char boundary.
    pub fn content_head(&self, limit: usize) -> &str {
        match self.markdown.char_indices().nth(limit) {
            Some((idx, _)) => &self.markdown[..idx],
            None => &self.markdown,
        }
    }
}

/// Wraps an external "fetch page content" capability: given a URL, returns
/// normalized text content plus metadata.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page.
    async fn fetch_page(&self, request: &FetchRequest) -> ClientResult<FetchedPage>;

    /// Fetcher name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

/// A fetcher that validates URLs before dispatch (SSRF protection).
///
/// Targets resolving to private, loopback, link-local or metadata ranges
/// are rejected with `ClientError::Security` without the inner fetcher
/// ever being called.
pub struct ValidatedFetcher<F: PageFetcher> {
    inner: F,
    validator: UrlValidator,
}

impl<F: PageFetcher> ValidatedFetcher<F> {
    /// Wrap a fetcher with default security rules.
    pub fn new(fetcher: F) -> Self {
        Self {
            inner: fetcher,
            validator: UrlValidator::new(),
        }
    }

    /// Wrap with a custom validator.
    pub fn with_validator(fetcher: F, validator: UrlValidator) -> Self {
        Self {
            inner: fetcher,
            validator,
        }
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for ValidatedFetcher<F> {
    async fn fetch_page(&self, request: &FetchRequest) -> ClientResult<FetchedPage> {
        if request.url.trim().is_empty() {
            return Err(ClientError::InvalidUrl {
                url: request.url.clone(),
            });
        }

        self.validator
            .validate_with_dns(&request.url)
            .await
            .map_err(ClientError::Security)?;

        self.inner.fetch_page(request).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

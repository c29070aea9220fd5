//! Testing utilities including mock client implementations.
//!
//! These are useful for testing applications that use the pipeline without
//! making real network or inference calls.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::error::{ClientError, ClientResult};
use crate::traits::analyst::ListingAnalyst;
use crate::traits::fetcher::{FetchRequest, FetchedPage, PageFetcher};
use crate::traits::mapper::{MapRequest, SiteMapper};

/// A mock site mapper returning canned link lists per URL.
#[derive(Default)]
pub struct MockMapper {
    links: Arc<RwLock<HashMap<String, Vec<String>>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<MapRequest>>>,
}

impl MockMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned links for a mapped URL.
    pub fn with_links(self, url: impl Into<String>, links: Vec<&str>) -> Self {
        self.links
            .write()
            .unwrap()
            .insert(url.into(), links.into_iter().map(String::from).collect());
        self
    }

    /// Make mapping this URL fail.
    pub fn with_failure(self, url: impl Into<String>) -> Self {
        self.failing.write().unwrap().insert(url.into());
        self
    }

    /// All map requests seen.
    pub fn calls(&self) -> Vec<MapRequest> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl SiteMapper for MockMapper {
    async fn map_site(&self, request: &MapRequest) -> ClientResult<Vec<String>> {
        self.calls.write().unwrap().push(request.clone());

        if self.failing.read().unwrap().contains(&request.url) {
            return Err(ClientError::Api {
                status: 502,
                message: format!("mock map failure for {}", request.url),
            });
        }

        let mut links = self
            .links
            .read()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or_default();
        links.truncate(request.limit);
        Ok(links)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock page fetcher serving canned pages per URL.
#[derive(Default)]
pub struct MockFetcher {
    pages: Arc<RwLock<HashMap<String, FetchedPage>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<FetchRequest>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned page for a URL.
    pub fn with_page(self, url: impl Into<String>, markdown: &str, title: Option<&str>) -> Self {
        self.pages.write().unwrap().insert(
            url.into(),
            FetchedPage {
                markdown: markdown.to_string(),
                title: title.map(String::from),
            },
        );
        self
    }

    /// Make fetching this URL fail.
    pub fn with_failure(self, url: impl Into<String>) -> Self {
        self.failing.write().unwrap().insert(url.into());
        self
    }

    /// All fetch requests seen.
    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch_page(&self, request: &FetchRequest) -> ClientResult<FetchedPage> {
        self.calls.write().unwrap().push(request.clone());

        if self.failing.read().unwrap().contains(&request.url) {
            return Err(ClientError::Timeout {
                url: request.url.clone(),
            });
        }

        self.pages
            .read()
            .unwrap()
            .get(&request.url)
            .cloned()
            .ok_or_else(|| ClientError::MissingContent {
                url: request.url.clone(),
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock analyst replaying a fixed response (or failing).
#[derive(Default)]
pub struct MockAnalyst {
    response: Arc<RwLock<Option<String>>>,
    fail: Arc<RwLock<bool>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockAnalyst {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed response text for every prompt.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        *self.response.write().unwrap() = Some(text.into());
        self
    }

    /// Make every inference call fail.
    pub fn with_failure(self) -> Self {
        *self.fail.write().unwrap() = true;
        self
    }

    /// All prompts seen.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ListingAnalyst for MockAnalyst {
    async fn analyze(&self, prompt: &str) -> ClientResult<String> {
        self.calls.write().unwrap().push(prompt.to_string());

        if *self.fail.read().unwrap() {
            return Err(ClientError::Api {
                status: 500,
                message: "mock inference failure".to_string(),
            });
        }

        Ok(self
            .response
            .read()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "{}".to_string()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

//! Structured-extraction (inference) abstraction.

use async_trait::async_trait;

use crate::error::ClientResult;

/// Wraps an external structured-extraction service.
///
/// Given a free-text prompt embedding listing content and pricing context,
/// returns the model's raw text response. The response is expected to be a
/// single JSON object but the caller must tolerate anything: parsing and
/// defensive defaults are the enrichment stage's responsibility, not the
/// client's.
#[async_trait]
pub trait ListingAnalyst: Send + Sync {
    /// Run one extraction prompt, returning the raw model text.
    async fn analyze(&self, prompt: &str) -> ClientResult<String>;

    /// Analyst name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

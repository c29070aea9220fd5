//! Typed errors for the prospecting pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

use crate::types::job::JobStatus;

/// Errors that abort a pipeline invocation.
///
/// Per-source and per-item failures are recovered locally inside the stages
/// and never surface as a `PipelineError`; only infrastructure-level
/// problems (storage unreachable, invalid configuration, illegal job
/// transitions) do.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration error (missing credentials, bad settings)
    #[error("config error: {0}")]
    Config(String),

    /// Illegal job status transition
    #[error("invalid job transition: {from:?} -> {to:?}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    /// Record not found in store
    #[error("not found: {0}")]
    NotFound(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from external service clients (discovery, retrieval, inference).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Security validation failed (SSRF guard)
    #[error("security error: {0}")]
    Security(#[from] SecurityError),

    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Service returned an error response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Request timed out
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Service responded without usable content
    #[error("no content returned for: {url}")]
    MissingContent { url: String },

    /// URL could not be parsed or is missing
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

/// Security-related errors, primarily for SSRF protection.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// URL scheme not allowed (e.g., file://, ftp://)
    #[error("disallowed URL scheme: {0}")]
    DisallowedScheme(String),

    /// Host is blocked (e.g., localhost, internal hostnames)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// IP in blocked CIDR range (e.g., 10.0.0.0/8)
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// DNS resolution failed
    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Result type alias for security checks.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;

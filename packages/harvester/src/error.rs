//! Typed errors for the harvester library.
//!
//! Every failure the core can observe is one of these variants. Most of them
//! are recoverable and get converted into a documented default by the caller
//! (no messages, not relevant, no link, fallback backend).

use thiserror::Error;

/// Top-level error for harvester operations.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Reasoning, compiler or object-store call failed
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// Response could not be parsed as the expected JSON shape
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Cooperative cancellation while waiting on a delay
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid or missing configuration
    #[error("config error: {0}")]
    Config(String),
}

impl HarvestError {
    /// True when this error is the interrupt signal rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HarvestError::Cancelled)
    }
}

/// Errors from fetching a channel page.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    #[error("channel @{channel} not found (404)")]
    NotFound { channel: String },

    #[error("channel @{channel} access forbidden (403)")]
    Forbidden { channel: String },

    #[error("rate limited while accessing @{channel} (429)")]
    RateLimited { channel: String },

    #[error("HTTP {status} for channel @{channel}")]
    Http { channel: String, status: u16 },

    #[error("network error: {0}")]
    Network(String),
}

/// Errors from the opaque request/response services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Connection failed, timeout
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Upstream enforced its request-rate ceiling
    #[error("rate limit exceeded")]
    RateLimited,

    /// Unexpected response shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Response parsed but carried nothing usable
    #[error("empty response")]
    EmptyResponse,

    /// Output failed structural validation
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing credentials or settings
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors from persistence backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for feed operations.
pub type FeedResult<T> = std::result::Result<T, FeedError>;

/// Result type alias for service calls.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

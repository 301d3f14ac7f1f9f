//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings system.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Caller passed a value outside the accepted range (e.g. `top_k == 0`).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Provider not configured.
    #[error("embedding provider `{0}` not configured")]
    ProviderNotConfigured(String),

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl EmbeddingError {
    /// Whether the error means the embedding capability could not be reached
    /// or produced nothing usable, as opposed to a caller mistake.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            EmbeddingError::ProviderNotConfigured(_)
                | EmbeddingError::ApiRequest(_)
                | EmbeddingError::InvalidResponse(_)
                | EmbeddingError::RateLimited { .. }
                | EmbeddingError::Serialization(_)
                | EmbeddingError::Http(_)
        )
    }
}

//! Error types for the retrieval pipeline.

use arxiv_insight_embeddings::EmbeddingError;
use arxiv_insight_papers::PaperError;
use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur while answering a request.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Non-positive chunk size or top-k.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Vectors of the wrong or non-uniform dimension reached the index.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding capability could not be reached or loaded.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The generation capability could not be reached or loaded.
    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// Paper discovery failed.
    #[error("discovery error: {0}")]
    Discovery(#[from] PaperError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<EmbeddingError> for RetrievalError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::InvalidArgument(msg) => RetrievalError::InvalidArgument(msg),
            EmbeddingError::DimensionMismatch { expected, actual } => {
                RetrievalError::DimensionMismatch { expected, actual }
            }
            other => RetrievalError::EmbeddingUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_errors_map_by_category() {
        assert!(matches!(
            RetrievalError::from(EmbeddingError::InvalidArgument("top_k".to_string())),
            RetrievalError::InvalidArgument(_)
        ));
        assert!(matches!(
            RetrievalError::from(EmbeddingError::DimensionMismatch {
                expected: 384,
                actual: 3
            }),
            RetrievalError::DimensionMismatch {
                expected: 384,
                actual: 3
            }
        ));
        assert!(matches!(
            RetrievalError::from(EmbeddingError::ApiRequest("down".to_string())),
            RetrievalError::EmbeddingUnavailable(_)
        ));
    }
}

//! Error types for paper discovery.

use thiserror::Error;

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, PaperError>;

/// Errors that can occur while fetching papers.
#[derive(Error, Debug)]
pub enum PaperError {
    /// Transport failure talking to the feed endpoint.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed endpoint answered with a non-success status.
    #[error("feed request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// The feed could not be parsed.
    #[error("malformed feed: {0}")]
    Feed(String),
}

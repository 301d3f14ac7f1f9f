//! # Embeddings
//!
//! This crate turns text chunks into unit-length vectors and ranks them
//! against a query for the arxiv-insight retrieval pipeline.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to dense vectors through a provider
//! - **Normalization**: Every vector leaves the [`Embedder`] with unit L2 norm
//! - **Flat Index**: Exact top-k search by inner product over a few dozen vectors
//! - **Multiple Providers**: OpenAI-compatible HTTP servers or local feature hashing
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedder ──► FlatIndex                   │
//! │       │                   │            │                        │
//! │       ▼                   ▼            ▼                        │
//! │  OpenAI/Hashing      normalize()    SearchHit                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod embedder;
pub mod error;
pub mod hashing;
pub mod index;
pub mod provider;
pub mod similarity;

pub use embedder::Embedder;
pub use error::{EmbeddingError, Result};
pub use hashing::HashingProvider;
pub use index::{FlatIndex, SearchHit};
pub use provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, OpenAIProvider};
pub use similarity::{cosine_similarity, dot_product, l2_norm, normalize};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings produced by small sentence encoders
/// (bge-small-en-v1.5, all-MiniLM-L6-v2).
pub const DEFAULT_DIMENSION: usize = 384;

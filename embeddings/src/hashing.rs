//! Local feature-hashing embedder.
//!
//! Each lowercase alphanumeric token is hashed into one of `dimension`
//! buckets with a hash-derived sign. Texts that share vocabulary end up with
//! a positive inner product, which is enough to rank a handful of abstract
//! chunks without a model server. Deterministic within a build.
//!
//! Text without any token lands in bucket 0 so that it still normalizes to
//! a unit vector.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use crate::error::Result;
use crate::provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use crate::{DEFAULT_DIMENSION, Embedding};

/// Embedding provider that needs no network or model files.
#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimension: usize,
}

impl HashingProvider {
    /// Create a provider with the default dimension.
    pub fn new() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }

    /// Set the number of hash buckets.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension.max(1);
        self
    }

    /// Embed one text. The result is not normalized.
    pub fn embed_text(&self, text: &str) -> Embedding {
        let mut embedding = vec![0.0f32; self.dimension];
        let mut tokens = 0usize;
        for token in tokenize(text) {
            let hash = bucket_hash(&token);
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
            tokens += 1;
        }
        if tokens == 0 {
            embedding[0] = 1.0;
        }
        embedding
    }
}

impl Default for HashingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn name(&self) -> &str {
        "hashing"
    }

    fn default_model(&self) -> &str {
        "feature-hashing"
    }

    fn default_dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        Ok(EmbeddingResponse {
            embedding: self.embed_text(&request.text),
            model: self.default_model().to_string(),
            dimension: self.dimension,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Split text into lowercase alphanumeric tokens.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn bucket_hash(token: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    hasher.finish()
}

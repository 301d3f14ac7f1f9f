//! Flat inner-product index for exact nearest-neighbor lookups.
//!
//! Retrieval builds one of these per request from a few dozen chunk vectors,
//! searches it once or twice, and drops it. Brute force over a contiguous
//! buffer is exact and fast at that size.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EmbeddingError, Result};
use crate::similarity::dot_product;

/// A single search hit: the position of a stored vector and its score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Insertion position of the vector, in `[0, len)`.
    pub id: usize,

    /// Inner product between the query and the stored vector.
    pub score: f32,
}

/// An in-memory index scored by inner product.
///
/// Vectors are expected to be unit length already (the [`crate::Embedder`]
/// guarantees this), so the score is the cosine similarity.
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    /// Row-major vector storage, `len * dimension` floats.
    data: Vec<f32>,

    /// Dimension of every stored vector. `None` while the index is empty.
    dimension: Option<usize>,

    /// Number of stored vectors.
    len: usize,
}

impl FlatIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a batch of vectors.
    pub fn from_vectors(vectors: &[Vec<f32>]) -> Result<Self> {
        let mut index = Self::new();
        index.build(vectors)?;
        Ok(index)
    }

    /// Replace the contents of the index with `vectors`.
    ///
    /// Building from zero vectors is legal and leaves the index empty. On a
    /// dimension mismatch the previous contents are kept.
    pub fn build(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        let Some(first) = vectors.first() else {
            self.data.clear();
            self.dimension = None;
            self.len = 0;
            debug!("Built empty flat index");
            return Ok(());
        };

        let dimension = first.len();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        let mut data = Vec::with_capacity(vectors.len() * dimension);
        for vector in vectors {
            data.extend_from_slice(vector);
        }

        self.data = data;
        self.dimension = Some(dimension);
        self.len = vectors.len();

        debug!("Built flat index with {} vectors of dimension {dimension}", self.len);
        Ok(())
    }

    /// Return the `top_k` stored vectors with the highest inner product
    /// against `query`, best first.
    ///
    /// The result has `min(top_k, len)` entries. Equal scores keep insertion
    /// order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        if top_k == 0 {
            return Err(EmbeddingError::InvalidArgument(
                "top_k must be greater than zero".to_string(),
            ));
        }

        let Some(dimension) = self.dimension else {
            return Ok(Vec::new());
        };

        if query.len() != dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: query.len(),
            });
        }

        let mut hits = Vec::with_capacity(self.len);
        for (id, row) in self.rows().enumerate() {
            hits.push(SearchHit {
                id,
                score: dot_product(query, row)?,
            });
        }

        // Stable sort: ties stay in insertion order.
        hits.sort_by_key(|hit| Reverse(OrderedFloat(hit.score)));
        hits.truncate(top_k);

        Ok(hits)
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Dimension of the stored vectors, if any are stored.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Get a stored vector by id.
    pub fn get(&self, id: usize) -> Option<&[f32]> {
        let dimension = self.dimension?;
        if id >= self.len {
            return None;
        }
        self.data.get(id * dimension..(id + 1) * dimension)
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        let dimension = self.dimension.unwrap_or(0);
        (0..self.len).filter_map(move |id| self.data.get(id * dimension..(id + 1) * dimension))
    }
}

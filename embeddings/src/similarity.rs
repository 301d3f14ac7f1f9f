//! Vector math shared by the embedder and the index.

use crate::error::{EmbeddingError, Result};

/// Cosine of the angle between `a` and `b`, in `[-1, 1]`. A zero vector
/// scores 0.0 against anything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let denominator = l2_norm(a) * l2_norm(b);
    let dot = dot_product(a, b)?;
    if denominator == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot / denominator)
    }
}

/// Inner product. Equals the cosine similarity for unit-length inputs, which
/// is what [`crate::FlatIndex`] relies on.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Euclidean length of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale `v` to unit length in place. Zero vectors stay zero.
pub fn normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

//! Query-time ranking of chunks.

use arxiv_insight_embeddings::{Embedder, FlatIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clean::clean_text;
use crate::error::{Result, RetrievalError};

/// A chunk and its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedChunk {
    pub text: String,
    pub score: f32,
}

/// Embeds a batch of chunks into a fresh index and ranks them against a
/// query. Nothing outlives a single [`ChunkRetriever::retrieve`] call.
#[derive(Debug, Clone)]
pub struct ChunkRetriever {
    embedder: Embedder,
}

impl ChunkRetriever {
    pub fn new(embedder: Embedder) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// Return up to `top_k` chunks most similar to `query`, best first.
    /// Equal scores keep the order of `chunks`.
    pub async fn retrieve(
        &self,
        chunks: &[String],
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RankedChunk>> {
        if top_k == 0 {
            return Err(RetrievalError::InvalidArgument(
                "top_k must be positive".to_string(),
            ));
        }
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let cleaned: Vec<String> = chunks.iter().map(|chunk| clean_text(chunk)).collect();
        let vectors = self.embedder.embed(&cleaned).await?;
        let index = FlatIndex::from_vectors(&vectors)?;

        let query_vector = self.embedder.embed_one(&clean_text(query)).await?;
        let hits = index.search(&query_vector, top_k)?;
        debug!("Ranked {} chunks, keeping {}", chunks.len(), hits.len());

        let ranked = hits
            .into_iter()
            .filter_map(|hit| match chunks.get(hit.id) {
                Some(text) => Some(RankedChunk {
                    text: text.clone(),
                    score: hit.score,
                }),
                None => {
                    warn!("Index returned id {} outside 0..{}", hit.id, chunks.len());
                    None
                }
            })
            .collect();

        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arxiv_insight_embeddings::{EmbeddingError, EmbeddingProvider, HashingProvider};
    use arxiv_insight_embeddings::{EmbeddingRequest, EmbeddingResponse};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;

    fn hashing_retriever() -> ChunkRetriever {
        ChunkRetriever::new(Embedder::new(Arc::new(HashingProvider::new())))
    }

    fn strings(texts: &[&str]) -> Vec<String> {
        texts.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_pose_estimation_ranks_first() {
        let chunks = strings(&[
            "Object detection with transformers.",
            "Human pose estimation in 3D space.",
            "Language models for text.",
        ]);

        let ranked = hashing_retriever()
            .retrieve(&chunks, "pose estimation in 3D", 2)
            .await
            .unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].text, "Human pose estimation in 3D space.");
        assert!(ranked[0].score >= ranked[1].score);
    }

    #[tokio::test]
    async fn test_pose_method_chunk_beats_unrelated_topics() {
        let chunks = strings(&[
            "This paper introduces a new pose estimation method.",
            "The authors propose a transformer for object detection.",
            "We explore reinforcement learning in robotics.",
        ]);

        let ranked = hashing_retriever()
            .retrieve(&chunks, "pose estimation in 3D", 2)
            .await
            .unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].text, chunks[0]);
        assert!(ranked[0].score > ranked[1].score);
        assert!(ranked.iter().all(|r| (-1.0..=1.0001).contains(&r.score)));
    }

    #[tokio::test]
    async fn test_top_k_larger_than_chunks() {
        let chunks = strings(&["alpha beta.", "gamma delta."]);

        let ranked = hashing_retriever()
            .retrieve(&chunks, "alpha", 10)
            .await
            .unwrap();

        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|r| (-1.0..=1.0001).contains(&r.score)));
    }

    #[tokio::test]
    async fn test_returns_original_chunk_text() {
        let chunks = strings(&["We study \\textbf{graph} networks."]);

        let ranked = hashing_retriever()
            .retrieve(&chunks, "graph networks", 1)
            .await
            .unwrap();

        assert_eq!(ranked[0].text, "We study \\textbf{graph} networks.");
    }

    #[tokio::test]
    async fn test_identical_chunks_keep_input_order() {
        let chunks = strings(&["same words here", "same words here", "other"]);

        let ranked = hashing_retriever()
            .retrieve(&chunks, "same words", 2)
            .await
            .unwrap();

        assert_eq!(ranked[0].score, ranked[1].score);
        assert_eq!(ranked[0].text, chunks[0]);
    }

    #[tokio::test]
    async fn test_empty_chunks() {
        let ranked = hashing_retriever().retrieve(&[], "anything", 3).await.unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn test_zero_top_k() {
        let result = hashing_retriever()
            .retrieve(&strings(&["text"]), "text", 0)
            .await;
        assert!(matches!(result, Err(RetrievalError::InvalidArgument(_))));
    }

    struct OfflineProvider;

    #[async_trait]
    impl EmbeddingProvider for OfflineProvider {
        fn name(&self) -> &str {
            "offline"
        }

        fn default_model(&self) -> &str {
            "none"
        }

        fn default_dimension(&self) -> usize {
            3
        }

        async fn embed(
            &self,
            _request: EmbeddingRequest,
        ) -> arxiv_insight_embeddings::Result<EmbeddingResponse> {
            Err(EmbeddingError::ApiRequest("connection refused".to_string()))
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let retriever = ChunkRetriever::new(Embedder::new(Arc::new(OfflineProvider)));

        let result = retriever.retrieve(&strings(&["text"]), "text", 1).await;

        assert!(matches!(
            result,
            Err(RetrievalError::EmbeddingUnavailable(_))
        ));
    }
}

//! Normalizing, batching front end over an [`EmbeddingProvider`].

use std::sync::Arc;

use tracing::debug;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::provider::{EmbeddingProvider, EmbeddingRequest};
use crate::similarity::{l2_norm, normalize};

/// Default number of texts sent to the provider per call.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Handle to the embedding capability, owned by the composition root and
/// passed to whatever needs vectors.
///
/// `embed(texts)[i]` always corresponds to `texts[i]`, and every returned
/// vector has unit L2 norm. A provider that answers with a zero vector is
/// rejected with [`EmbeddingError::InvalidResponse`].
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    model: Option<String>,
    batch_size: usize,
}

impl Embedder {
    /// Wrap a provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            model: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the provider's default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set how many texts go into one provider call.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Name of the wrapped provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Dimension the wrapped provider reports.
    pub fn dimension(&self) -> usize {
        self.provider.default_dimension()
    }

    /// Embed `texts`, preserving order and length.
    pub async fn embed<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if !self.provider.is_available() {
            return Err(EmbeddingError::ProviderNotConfigured(
                self.provider.name().to_string(),
            ));
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let requests: Vec<EmbeddingRequest> = batch
                .iter()
                .map(|text| {
                    let request = EmbeddingRequest::new(text.as_ref());
                    match &self.model {
                        Some(model) => request.with_model(model.as_str()),
                        None => request,
                    }
                })
                .collect();

            let responses = self.provider.embed_batch(requests).await?;
            if responses.len() != batch.len() {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "provider `{}` returned {} embeddings for {} texts",
                    self.provider.name(),
                    responses.len(),
                    batch.len()
                )));
            }

            for response in responses {
                let mut embedding = response.embedding;
                if l2_norm(&embedding) == 0.0 {
                    return Err(EmbeddingError::InvalidResponse(format!(
                        "provider `{}` returned a zero vector",
                        self.provider.name()
                    )));
                }
                normalize(&mut embedding);
                embeddings.push(embedding);
            }
        }

        debug!(
            "Embedded {} texts with provider {}",
            embeddings.len(),
            self.provider.name()
        );

        Ok(embeddings)
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Embedding> {
        self.embed(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding returned".to_string()))
    }
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

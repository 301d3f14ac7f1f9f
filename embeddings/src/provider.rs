//! Embedding providers.
//!
//! A provider is the external capability that turns text into vectors. The
//! [`crate::Embedder`] wraps one and owns normalization and batching.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Base URL of the hosted OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// One text to embed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub text: String,

    /// Overrides the provider's default model when set.
    pub model: Option<String>,
}

impl EmbeddingRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// A raw, not yet normalized vector for one [`EmbeddingRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub embedding: Embedding,

    /// Model that produced the vector.
    pub model: String,

    /// Length of `embedding`.
    pub dimension: usize,
}

/// Source of text embeddings: a model server, a hosted API or a local
/// function.
///
/// Implementations report failures as errors and never retry; callers decide
/// what an unreachable provider means for the request.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    fn default_model(&self) -> &str;

    /// Length of the vectors this provider returns.
    fn default_dimension(&self) -> usize;

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Embed several texts. The output order matches `requests`.
    ///
    /// The provided implementation calls [`EmbeddingProvider::embed`] once per
    /// request; HTTP providers override it with a single round trip.
    async fn embed_batch(&self, requests: Vec<EmbeddingRequest>) -> Result<Vec<EmbeddingResponse>> {
        let mut responses = Vec::with_capacity(requests.len());
        for request in requests {
            responses.push(self.embed(request).await?);
        }
        Ok(responses)
    }

    /// Whether the provider is configured well enough to try a call.
    fn is_available(&self) -> bool;
}

/// OpenAI-compatible embedding provider.
///
/// Talks to `{base_url}/embeddings`. Besides the hosted OpenAI API this works
/// with self-hosted servers that expose the same route (text-embeddings-inference,
/// Ollama, vLLM), which is how a bge-small style encoder is usually served.
pub struct OpenAIProvider {
    /// API key. Required only for the hosted OpenAI endpoint.
    api_key: Option<String>,

    base_url: String,
    client: reqwest::Client,
    default_model: String,

    /// Dimension override for models the provider does not know.
    dimension: Option<usize>,
}

impl OpenAIProvider {
    /// Provider for the hosted API, keyed from `OPENAI_API_KEY` when set.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: OPENAI_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            default_model: "text-embedding-3-small".to_string(),
            dimension: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Point at a compatible server, e.g. `http://localhost:8080/v1`.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Declare the embedding dimension of the configured model.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    fn is_hosted_openai(&self) -> bool {
        self.base_url == OPENAI_BASE_URL
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        match &self.api_key {
            Some(api_key) => Ok(builder.header("Authorization", format!("Bearer {api_key}"))),
            None if self.is_hosted_openai() => {
                Err(EmbeddingError::ProviderNotConfigured(self.name().to_string()))
            }
            None => Ok(builder),
        }
    }

    async fn post_embeddings(&self, body: serde_json::Value) -> Result<OpenAIEmbeddingResponse> {
        let request = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);

        let response = self.authorized(request)?.send().await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "API error ({status}): {error_text}"
            )));
        }

        Ok(response.json().await?)
    }
}

impl Default for OpenAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn default_dimension(&self) -> usize {
        if let Some(dimension) = self.dimension {
            return dimension;
        }
        match self.default_model.as_str() {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            "BAAI/bge-small-en-v1.5" | "all-MiniLM-L6-v2" => 384,
            _ => 1536,
        }
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        self.embed_batch(vec![request])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding in response".to_string()))
    }

    async fn embed_batch(&self, requests: Vec<EmbeddingRequest>) -> Result<Vec<EmbeddingResponse>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let model = requests[0]
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let texts: Vec<&str> = requests.iter().map(|r| r.text.as_str()).collect();

        debug!(
            "Generating batch embeddings for {} texts with model: {model}",
            texts.len()
        );

        let body = serde_json::json!({
            "input": texts,
            "model": model
        });

        let mut result = self.post_embeddings(body).await?;

        if result.data.len() != requests.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                requests.len(),
                result.data.len()
            )));
        }

        // Servers may answer out of order; `index` ties each vector to its input.
        result.data.sort_by_key(|item| item.index);

        let model = result.model.unwrap_or(model);
        let responses: Vec<EmbeddingResponse> = result
            .data
            .into_iter()
            .map(|item| {
                let dimension = item.embedding.len();
                EmbeddingResponse {
                    embedding: item.embedding,
                    model: model.clone(),
                    dimension,
                }
            })
            .collect();

        info!("Generated {} batch embeddings", responses.len());

        Ok(responses)
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some() || !self.is_hosted_openai()
    }
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_embedding_request() {
        let request = EmbeddingRequest::new("Hello world").with_model("text-embedding-3-small");

        assert_eq!(request.text, "Hello world");
        assert_eq!(request.model, Some("text-embedding-3-small".to_string()));
    }

    #[test]
    fn test_openai_provider_default_dimensions() {
        let provider = OpenAIProvider::new().with_model("text-embedding-3-large");
        assert_eq!(provider.default_dimension(), 3072);

        let provider = OpenAIProvider::new().with_model("BAAI/bge-small-en-v1.5");
        assert_eq!(provider.default_dimension(), 384);

        let provider = OpenAIProvider::new().with_model("custom").with_dimension(768);
        assert_eq!(provider.default_dimension(), 768);
    }

    #[tokio::test]
    async fn test_batch_restores_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "input": ["first", "second"],
                "model": "bge-small"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "embedding": [0.0, 1.0], "index": 1 },
                    { "embedding": [1.0, 0.0], "index": 0 }
                ],
                "model": "bge-small"
            })))
            .mount(&server)
            .await;

        let provider = OpenAIProvider::new()
            .with_api_key("test-key")
            .with_base_url(format!("{}/v1", server.uri()))
            .with_model("bge-small");

        let responses = provider
            .embed_batch(vec![
                EmbeddingRequest::new("first"),
                EmbeddingRequest::new("second"),
            ])
            .await
            .unwrap();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].embedding, vec![1.0, 0.0]);
        assert_eq!(responses[1].embedding, vec![0.0, 1.0]);
        assert_eq!(responses[0].model, "bge-small");
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let provider = OpenAIProvider::new().with_base_url(server.uri());
        let err = provider
            .embed(EmbeddingRequest::new("text"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EmbeddingError::RateLimited {
                retry_after_secs: 7
            }
        ));
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_count_mismatch_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [1.0], "index": 0 }]
            })))
            .mount(&server)
            .await;

        let provider = OpenAIProvider::new().with_base_url(server.uri());
        let err = provider
            .embed_batch(vec![EmbeddingRequest::new("a"), EmbeddingRequest::new("b")])
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_hosted_endpoint_requires_key() {
        let provider = OpenAIProvider {
            api_key: None,
            ..OpenAIProvider::new()
        };

        assert!(!provider.is_available());
        let err = provider
            .embed(EmbeddingRequest::new("text"))
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::ProviderNotConfigured(_)));
    }
}

//! Configuration for arxiv-insight.
//!
//! Every section has defaults, so a config file only needs the keys it
//! changes:
//!
//! ```toml
//! task = "extract-method"
//!
//! [embedding]
//! provider = "open_ai"
//! base_url = "http://localhost:8080/v1"
//!
//! [rag]
//! top_k = 3
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use arxiv_insight_embeddings::DEFAULT_DIMENSION;
use arxiv_insight_embeddings::embedder::DEFAULT_BATCH_SIZE;
use arxiv_insight_papers::DEFAULT_ARXIV_URL;

use crate::chunker::DEFAULT_CHUNK_SIZE;
use crate::error::{Result, RetrievalError};
use crate::generation::{DEFAULT_COMPLETION_MODEL, DEFAULT_COMPLETION_URL, GeneratorKind};
use crate::prompt::TaskSelector;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Task used when a request does not name one.
    pub task: TaskSelector,

    /// Paper discovery.
    pub discovery: DiscoveryConfig,

    /// Embedding backend.
    pub embedding: EmbeddingConfig,

    /// Generation backend.
    pub generation: GenerationConfig,

    /// Chunking and retrieval.
    pub rag: RagConfig,
}

impl InsightConfig {
    /// `<config_dir>/arxiv-insight/config.toml`, if the platform has a
    /// config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("arxiv-insight").join("config.toml"))
    }

    /// Load and validate the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            RetrievalError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, otherwise the default file when it exists,
    /// otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Reject settings no request could run with.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.rag.chunk_size, "rag.chunk_size"),
            (self.rag.top_k, "rag.top_k"),
            (self.embedding.dimension, "embedding.dimension"),
            (self.embedding.batch_size, "embedding.batch_size"),
            (self.discovery.max_fetch, "discovery.max_fetch"),
            (self.discovery.max_display, "discovery.max_display"),
        ];
        for (value, key) in checks {
            if value == 0 {
                return Err(RetrievalError::Config(format!("{key} must be positive")));
            }
        }
        Ok(())
    }

    pub fn with_task(mut self, task: TaskSelector) -> Self {
        self.task = task;
        self
    }

    pub fn with_discovery(mut self, config: DiscoveryConfig) -> Self {
        self.discovery = config;
        self
    }

    pub fn with_embedding(mut self, config: EmbeddingConfig) -> Self {
        self.embedding = config;
        self
    }

    pub fn with_generation(mut self, config: GenerationConfig) -> Self {
        self.generation = config;
        self
    }

    pub fn with_rag(mut self, config: RagConfig) -> Self {
        self.rag = config;
        self
    }
}

/// Where and how papers are fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// arXiv query endpoint.
    pub base_url: String,

    /// Only papers published this many days back are kept.
    pub days_back: u32,

    /// Papers fetched per category.
    pub max_fetch: usize,

    /// Matching papers answered.
    pub max_display: usize,

    pub timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ARXIV_URL.to_string(),
            days_back: 7,
            max_fetch: 100,
            max_display: 5,
            timeout_secs: 30,
        }
    }
}

/// Type of embedding provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderType {
    /// Local feature hashing.
    #[default]
    Hashing,
    /// OpenAI or a compatible `/embeddings` server.
    OpenAi,
}

/// Configuration for the embedding provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderType,

    /// Server base URL (OpenAI-compatible provider only).
    pub base_url: Option<String>,

    /// Model override.
    pub model: Option<String>,

    /// API key; falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,

    /// Vector dimension.
    pub dimension: usize,

    /// Texts per provider call.
    pub batch_size: usize,
}

impl EmbeddingConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.is_empty())
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderType::default(),
            base_url: None,
            model: None,
            api_key: None,
            dimension: DEFAULT_DIMENSION,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Configuration for the generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub generator: GeneratorKind,

    /// Completion server base URL.
    pub base_url: String,

    pub model: String,

    /// API key; falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,

    pub temperature: f32,

    pub timeout_secs: u64,
}

impl GenerationConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.is_empty())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorKind::default(),
            base_url: DEFAULT_COMPLETION_URL.to_string(),
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            api_key: None,
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

/// Chunking and retrieval settings for RAG mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Sentences per chunk.
    pub chunk_size: usize,

    /// Chunks placed in the prompt.
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            top_k: 5,
        }
    }
}

//! # Retrieval
//!
//! Turns a keyword into answers about recent arXiv papers.
//!
//! - **Cleaning**: LaTeX markup is stripped before anything is embedded or prompted
//! - **Chunking**: Abstracts are cut into windows of consecutive sentences
//! - **Retrieval**: Chunks are embedded into a per-request index and ranked
//! - **Prompting**: A fixed task table decides what the generator is asked
//! - **Generation**: A completion server or a local extractive summarizer answers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        InsightEngine                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  PaperSource ──► keyword_filter ──┬──► build_prompt ──┐         │
//! │                                   │   (per paper)     │         │
//! │                                   ▼                   ▼         │
//! │                 clean_text ──► SentenceChunker   TextGenerator  │
//! │                                   │                   ▲         │
//! │                                   ▼                   │         │
//! │                 ChunkRetriever (Embedder + FlatIndex) │         │
//! │                                   │                   │         │
//! │                                   └──► build_prompt ──┘         │
//! │                                        (retrieved context)      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use arxiv_insight_retrieval::{InsightConfig, InsightEngine, InsightRequest};
//!
//! let config = InsightConfig::load(None)?;
//! let engine = InsightEngine::from_config(&config)?;
//!
//! let request = InsightRequest::from_config("pose estimation", &config).with_rag(true);
//! let report = engine.run(&request).await?;
//! ```

pub mod chunker;
pub mod clean;
pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod prompt;
pub mod retriever;

pub use chunker::{Chunk, NaiveSentenceSplitter, SentenceChunker, SentenceSplitter, chunk_text};
pub use clean::clean_text;
pub use config::{
    DiscoveryConfig, EmbeddingConfig, EmbeddingProviderType, GenerationConfig, InsightConfig,
    RagConfig,
};
pub use engine::{
    InsightEngine, InsightEngineBuilder, InsightOutcome, InsightReport, InsightRequest,
    PaperAnswer,
};
pub use error::{Result, RetrievalError};
pub use generation::{
    CompletionGenerator, ExtractiveGenerator, GenerationOptions, GeneratorKind, TextGenerator,
};
pub use prompt::{
    PromptContext, TASK_PROFILES, TaskProfile, TaskSelector, build_document_prompt, build_prompt,
    build_rag_prompt, instruction, source_text,
};
pub use retriever::{ChunkRetriever, RankedChunk};

// Re-export from dependencies for convenience
pub use arxiv_insight_embeddings::{Embedder, EmbeddingProvider, FlatIndex, HashingProvider};
pub use arxiv_insight_papers::{ArxivClient, PaperRecord, PaperSource};

//! Request-scoped pipeline: fetch, filter, then answer.

use std::sync::Arc;
use std::time::Duration;

use arxiv_insight_embeddings::{Embedder, HashingProvider, OpenAIProvider};
use arxiv_insight_papers::{ArxivClient, PaperRecord, PaperSource, keyword_filter};
use serde::Serialize;
use tracing::{debug, info};

use crate::chunker::SentenceChunker;
use crate::clean::clean_text;
use crate::config::{
    EmbeddingConfig, EmbeddingProviderType, GenerationConfig, InsightConfig, RagConfig,
};
use crate::error::{Result, RetrievalError};
use crate::generation::{
    CompletionGenerator, ExtractiveGenerator, GenerationOptions, GeneratorKind, TextGenerator,
};
use crate::prompt::{PromptContext, TaskSelector, build_prompt};
use crate::retriever::{ChunkRetriever, RankedChunk};

/// One user request.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightRequest {
    /// Case-insensitive phrase matched against titles and abstracts.
    pub keyword: String,

    /// arXiv category code; `None` searches the default categories.
    pub category: Option<String>,

    /// Papers fetched per category.
    pub max_fetch: usize,

    /// Matching papers kept.
    pub max_display: usize,

    pub task: TaskSelector,

    /// Answer once over retrieved chunks instead of once per paper.
    pub rag: bool,

    pub days_back: u32,
}

impl InsightRequest {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            category: None,
            max_fetch: 100,
            max_display: 5,
            task: TaskSelector::Summarize,
            rag: false,
            days_back: 7,
        }
    }

    /// A request for `keyword` using the configured defaults.
    pub fn from_config(keyword: impl Into<String>, config: &InsightConfig) -> Self {
        Self {
            max_fetch: config.discovery.max_fetch,
            max_display: config.discovery.max_display,
            task: config.task,
            days_back: config.discovery.days_back,
            ..Self::new(keyword)
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_max_fetch(mut self, max_fetch: usize) -> Self {
        self.max_fetch = max_fetch;
        self
    }

    pub fn with_max_display(mut self, max_display: usize) -> Self {
        self.max_display = max_display;
        self
    }

    pub fn with_task(mut self, task: TaskSelector) -> Self {
        self.task = task;
        self
    }

    pub fn with_rag(mut self, rag: bool) -> Self {
        self.rag = rag;
        self
    }

    pub fn with_days_back(mut self, days_back: u32) -> Self {
        self.days_back = days_back;
        self
    }
}

/// A paper and the answer generated from its abstract.
#[derive(Debug, Clone, Serialize)]
pub struct PaperAnswer {
    pub paper: PaperRecord,
    pub answer: String,
}

/// What a request produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InsightOutcome {
    /// No fetched paper contained the keyword.
    NoMatches,

    /// One answer per matching paper, in match order.
    PerPaper { answers: Vec<PaperAnswer> },

    /// One answer over the chunks retrieved from all matching papers.
    Rag {
        papers: Vec<PaperRecord>,
        contexts: Vec<RankedChunk>,
        answer: String,
    },
}

/// Result of [`InsightEngine::run`].
#[derive(Debug, Clone, Serialize)]
pub struct InsightReport {
    pub keyword: String,
    pub task: TaskSelector,

    /// Papers fetched before filtering.
    pub fetched: usize,

    pub outcome: InsightOutcome,
}

impl InsightReport {
    /// Number of papers that matched the keyword.
    pub fn matched(&self) -> usize {
        match &self.outcome {
            InsightOutcome::NoMatches => 0,
            InsightOutcome::PerPaper { answers } => answers.len(),
            InsightOutcome::Rag { papers, .. } => papers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.outcome, InsightOutcome::NoMatches)
    }
}

/// Answers [`InsightRequest`]s.
///
/// Holds the discovery, embedding and generation handles; everything else
/// (papers, chunks, the index) lives for one [`InsightEngine::run`] call.
pub struct InsightEngine {
    source: Arc<dyn PaperSource>,
    retriever: ChunkRetriever,
    generator: Arc<dyn TextGenerator>,
    rag: RagConfig,
    temperature: f32,
}

impl InsightEngine {
    /// Create a new engine builder.
    pub fn builder() -> InsightEngineBuilder {
        InsightEngineBuilder::new()
    }

    /// Build the arXiv client and the configured backends.
    pub fn from_config(config: &InsightConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Initializing engine (embedding: {:?}, generator: {:?})",
            config.embedding.provider, config.generation.generator
        );

        let source = ArxivClient::new()
            .with_base_url(config.discovery.base_url.clone())
            .with_timeout(Duration::from_secs(config.discovery.timeout_secs));

        Self::builder()
            .with_source(Arc::new(source))
            .with_embedder(embedder_from_config(&config.embedding))
            .with_generator(generator_from_config(&config.generation))
            .with_rag(config.rag.clone())
            .with_temperature(config.generation.temperature)
            .build()
    }

    /// Fetch, filter and answer one request.
    pub async fn run(&self, request: &InsightRequest) -> Result<InsightReport> {
        if request.max_fetch == 0 || request.max_display == 0 {
            return Err(RetrievalError::InvalidArgument(
                "max_fetch and max_display must be positive".to_string(),
            ));
        }

        let fetched = self
            .source
            .fetch_recent(
                request.category.as_deref(),
                request.max_fetch,
                request.days_back,
            )
            .await?;
        let total = fetched.len();

        let matched = keyword_filter(fetched, &request.keyword, request.max_display);
        info!(
            "{} of {total} papers from {} match {:?}",
            matched.len(),
            self.source.name(),
            request.keyword
        );

        let outcome = if matched.is_empty() {
            InsightOutcome::NoMatches
        } else if request.rag {
            self.answer_rag(matched, request).await?
        } else {
            self.answer_each(matched, request.task).await?
        };

        Ok(InsightReport {
            keyword: request.keyword.clone(),
            task: request.task,
            fetched: total,
            outcome,
        })
    }

    async fn answer_each(
        &self,
        papers: Vec<PaperRecord>,
        task: TaskSelector,
    ) -> Result<InsightOutcome> {
        let options = self.options(task);
        let mut answers = Vec::with_capacity(papers.len());
        for paper in papers {
            let prompt = build_prompt(PromptContext::Document(&paper.abstract_text), task);
            let answer = self.generator.generate(&prompt, &options).await?;
            debug!("Answered {:?} with {}", paper.title, self.generator.name());
            answers.push(PaperAnswer { paper, answer });
        }
        Ok(InsightOutcome::PerPaper { answers })
    }

    async fn answer_rag(
        &self,
        papers: Vec<PaperRecord>,
        request: &InsightRequest,
    ) -> Result<InsightOutcome> {
        let chunker = SentenceChunker::new(self.rag.chunk_size)?;
        let chunks: Vec<String> = papers
            .iter()
            .flat_map(|paper| chunker.chunk(&clean_text(&paper.abstract_text)))
            .map(|chunk| chunk.content)
            .collect();
        debug!("{} chunks from {} abstracts", chunks.len(), papers.len());

        let contexts = self
            .retriever
            .retrieve(&chunks, &request.keyword, self.rag.top_k)
            .await?;
        let texts: Vec<String> = contexts.iter().map(|c| c.text.clone()).collect();

        let prompt = build_prompt(PromptContext::Retrieved(&texts), request.task);
        let answer = self
            .generator
            .generate(&prompt, &self.options(request.task))
            .await?;

        Ok(InsightOutcome::Rag {
            papers,
            contexts,
            answer,
        })
    }

    fn options(&self, task: TaskSelector) -> GenerationOptions {
        GenerationOptions::for_task(task).with_temperature(self.temperature)
    }
}

fn embedder_from_config(config: &EmbeddingConfig) -> Embedder {
    let provider: Arc<dyn arxiv_insight_embeddings::EmbeddingProvider> = match config.provider {
        EmbeddingProviderType::Hashing => {
            Arc::new(HashingProvider::new().with_dimension(config.dimension))
        }
        EmbeddingProviderType::OpenAi => {
            let mut provider = OpenAIProvider::new().with_dimension(config.dimension);
            if let Some(url) = &config.base_url {
                provider = provider.with_base_url(url.as_str());
            }
            if let Some(model) = &config.model {
                provider = provider.with_model(model.as_str());
            }
            if let Some(key) = config.resolved_api_key() {
                provider = provider.with_api_key(key);
            }
            Arc::new(provider)
        }
    };
    Embedder::new(provider).with_batch_size(config.batch_size)
}

fn generator_from_config(config: &GenerationConfig) -> Arc<dyn TextGenerator> {
    match config.generator {
        GeneratorKind::Extractive => Arc::new(ExtractiveGenerator::new()),
        GeneratorKind::Completion => {
            let mut generator = CompletionGenerator::new()
                .with_base_url(config.base_url.as_str())
                .with_model(config.model.as_str())
                .with_timeout(Duration::from_secs(config.timeout_secs));
            if let Some(key) = config.resolved_api_key() {
                generator = generator.with_api_key(key);
            }
            Arc::new(generator)
        }
    }
}

/// Builder for [`InsightEngine`].
pub struct InsightEngineBuilder {
    source: Option<Arc<dyn PaperSource>>,
    embedder: Option<Embedder>,
    generator: Option<Arc<dyn TextGenerator>>,
    rag: RagConfig,
    temperature: f32,
}

impl InsightEngineBuilder {
    /// Create a new builder. The embedder defaults to local hashing and the
    /// generator to extractive summaries; a paper source is required.
    pub fn new() -> Self {
        Self {
            source: None,
            embedder: None,
            generator: None,
            rag: RagConfig::default(),
            temperature: GenerationConfig::default().temperature,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn PaperSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_embedder(mut self, embedder: Embedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_rag(mut self, rag: RagConfig) -> Self {
        self.rag = rag;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<InsightEngine> {
        let source = self
            .source
            .ok_or_else(|| RetrievalError::Config("no paper source configured".to_string()))?;
        if self.rag.chunk_size == 0 || self.rag.top_k == 0 {
            return Err(RetrievalError::Config(
                "rag.chunk_size and rag.top_k must be positive".to_string(),
            ));
        }

        let embedder = self
            .embedder
            .unwrap_or_else(|| Embedder::new(Arc::new(HashingProvider::new())));
        let generator = self
            .generator
            .unwrap_or_else(|| Arc::new(ExtractiveGenerator::new()));

        Ok(InsightEngine {
            source,
            retriever: ChunkRetriever::new(embedder),
            generator,
            rag: self.rag,
            temperature: self.temperature,
        })
    }
}

impl Default for InsightEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

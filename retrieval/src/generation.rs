//! Text generation backends.
//!
//! A [`TextGenerator`] turns a finished prompt into an answer. Two
//! implementations are provided:
//!
//! - [`CompletionGenerator`]: an OpenAI-compatible `/completions` server, which
//!   is how a base model such as Qwen3-1.7B-Base is usually served locally
//!   (vLLM, llama.cpp, text-generation-inference).
//! - [`ExtractiveGenerator`]: picks the most salient sentences of the source
//!   text. Needs no model and is always available.
//!
//! Which one runs is decided once at startup from [`GeneratorKind`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chunker::{NaiveSentenceSplitter, SentenceSplitter};
use crate::error::{Result, RetrievalError};
use crate::prompt::{TaskSelector, source_text};

/// Default endpoint of a locally hosted completion server.
pub const DEFAULT_COMPLETION_URL: &str = "http://localhost:8000/v1";

/// Model requested from the completion server unless configured otherwise.
pub const DEFAULT_COMPLETION_MODEL: &str = "Qwen/Qwen3-1.7B-Base";

/// Available generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    /// OpenAI-compatible completion API.
    Completion,
    /// Local sentence extraction.
    #[default]
    Extractive,
}

/// Per-call knobs. Each backend reads the fields that apply to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Upper bound on generated tokens (completion).
    pub max_new_tokens: usize,

    /// Sampling temperature (completion).
    pub temperature: f32,

    /// Lower bound on answer length in words (extractive).
    pub min_words: usize,

    /// Upper bound on answer length in words (extractive).
    pub max_words: usize,
}

impl GenerationOptions {
    /// Options sized for `task`.
    pub fn for_task(task: TaskSelector) -> Self {
        let profile = task.profile();
        Self {
            max_new_tokens: profile.max_new_tokens,
            min_words: profile.min_words,
            max_words: profile.max_words,
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: 200,
            temperature: 0.7,
            min_words: 30,
            max_words: 80,
        }
    }
}

/// The generation capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Produce an answer for `prompt`. Only the new text is returned, trimmed.
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;
}

/// Client for `POST {base_url}/completions`.
pub struct CompletionGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl CompletionGenerator {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_COMPLETION_URL.to_string(),
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for CompletionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

#[async_trait]
impl TextGenerator for CompletionGenerator {
    fn name(&self) -> &str {
        "completion"
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let url = format!("{}/completions", self.base_url);
        let body = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens: options.max_new_tokens,
            temperature: options.temperature,
        };

        let mut request = self.client.post(&url).timeout(self.timeout).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RetrievalError::GenerationUnavailable(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Completion server returned {status}");
            return Err(RetrievalError::GenerationUnavailable(format!(
                "{url} returned {status}: {text}"
            )));
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            RetrievalError::GenerationUnavailable(format!("malformed completion response: {e}"))
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text.trim().to_string())
            .ok_or_else(|| {
                RetrievalError::GenerationUnavailable("completion response had no choices".into())
            })?;

        debug!("Generated {} chars with {}", text.len(), self.model);
        Ok(text)
    }
}

/// Words ignored when scoring sentences.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "for", "from", "has", "have", "in",
    "is", "it", "its", "of", "on", "or", "our", "that", "the", "their", "these", "this", "to",
    "we", "which", "with",
];

/// Frequency-based extractive summarizer.
///
/// Sentences are scored by the mean corpus frequency of their content words
/// and the best ones are kept, in their original order, until the word
/// budget is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveGenerator;

impl ExtractiveGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Pick sentences from `text` within the word bounds of `options`.
    pub fn summarize(&self, text: &str, options: &GenerationOptions) -> String {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let sentences = NaiveSentenceSplitter.split(&normalized);
        let word_counts: Vec<usize> = sentences
            .iter()
            .map(|s| s.split_whitespace().count())
            .collect();

        if word_counts.iter().sum::<usize>() <= options.max_words {
            return normalized;
        }

        let mut frequencies: HashMap<String, usize> = HashMap::new();
        for sentence in &sentences {
            for word in content_words(sentence) {
                *frequencies.entry(word).or_default() += 1;
            }
        }

        let scores: Vec<f32> = sentences
            .iter()
            .map(|sentence| {
                let words: Vec<String> = content_words(sentence).collect();
                if words.is_empty() {
                    return 0.0;
                }
                let total: usize = words.iter().filter_map(|w| frequencies.get(w)).sum();
                total as f32 / words.len() as f32
            })
            .collect();

        let mut order: Vec<usize> = (0..sentences.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut keep = vec![false; sentences.len()];
        let mut words = 0;
        for idx in order {
            if words >= options.max_words {
                break;
            }
            if words < options.min_words || words + word_counts[idx] <= options.max_words {
                keep[idx] = true;
                words += word_counts[idx];
            }
        }

        sentences
            .iter()
            .zip(keep)
            .filter_map(|(sentence, kept)| kept.then_some(*sentence))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl TextGenerator for ExtractiveGenerator {
    fn name(&self) -> &str {
        "extractive"
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        Ok(self.summarize(&source_text(prompt), options))
    }
}

fn content_words(sentence: &str) -> impl Iterator<Item = String> + '_ {
    sentence
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::build_document_prompt;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ABSTRACT: &str = "Pose estimation recovers human joints from images. \
        We propose a transformer for pose estimation in crowded scenes. \
        The weather was pleasant during data collection. \
        Our transformer improves pose estimation accuracy on three benchmarks.";

    #[test]
    fn test_short_text_is_returned_whole() {
        let options = GenerationOptions::default();
        assert_eq!(
            ExtractiveGenerator.summarize("  One line.   Two line. ", &options),
            "One line. Two line."
        );
    }

    #[test]
    fn test_extractive_drops_off_topic_sentence() {
        let options = GenerationOptions {
            min_words: 10,
            max_words: 25,
            ..GenerationOptions::default()
        };

        let summary = ExtractiveGenerator.summarize(ABSTRACT, &options);

        assert!(!summary.contains("weather"));
        assert!(summary.split_whitespace().count() <= 25);
        assert!(summary.split_whitespace().count() >= 10);
    }

    #[test]
    fn test_extractive_keeps_original_order() {
        let options = GenerationOptions {
            min_words: 1,
            max_words: 30,
            ..GenerationOptions::default()
        };

        let summary = ExtractiveGenerator.summarize(ABSTRACT, &options);

        let propose = summary.find("We propose").unwrap();
        let improves = summary.find("Our transformer").unwrap();
        assert!(propose < improves);
    }

    #[tokio::test]
    async fn test_extractive_ignores_instruction() {
        let prompt = build_document_prompt("A short abstract.", TaskSelector::ExtractMethod);

        let answer = ExtractiveGenerator
            .generate(&prompt, &GenerationOptions::for_task(TaskSelector::ExtractMethod))
            .await
            .unwrap();

        assert_eq!(answer, "A short abstract.");
    }

    #[tokio::test]
    async fn test_extractive_empty_prompt() {
        let answer = ExtractiveGenerator
            .generate("", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(answer, "");
    }

    #[test]
    fn test_options_follow_task_profile() {
        let options = GenerationOptions::for_task(TaskSelector::StructuredSummaryAll);
        let profile = TaskSelector::StructuredSummaryAll.profile();
        assert_eq!(options.max_new_tokens, profile.max_new_tokens);
        assert_eq!(options.max_words, profile.max_words);
    }

    #[tokio::test]
    async fn test_completion_returns_trimmed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({
                "model": "tiny-model",
                "prompt": "Summarize this.",
                "max_tokens": 200
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "text": "  A concise answer.\n" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generator = CompletionGenerator::new()
            .with_base_url(format!("{}/v1/", server.uri()))
            .with_model("tiny-model")
            .with_api_key("secret");

        let answer = generator
            .generate("Summarize this.", &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(answer, "A concise answer.");
    }

    #[tokio::test]
    async fn test_completion_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("loading model"))
            .mount(&server)
            .await;

        let generator = CompletionGenerator::new().with_base_url(server.uri());

        let result = generator
            .generate("prompt", &GenerationOptions::default())
            .await;

        assert!(matches!(
            result,
            Err(RetrievalError::GenerationUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_completion_unreachable() {
        let generator = CompletionGenerator::new()
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2));

        let result = generator
            .generate("prompt", &GenerationOptions::default())
            .await;

        assert!(matches!(
            result,
            Err(RetrievalError::GenerationUnavailable(_))
        ));
    }
}

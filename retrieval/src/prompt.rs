//! Task routing and prompt assembly.
//!
//! Every task the user can pick maps to one row of [`TASK_PROFILES`]: the
//! instruction used when a single abstract is summarized, the instruction
//! used after retrieved context, and how long the answer should be.

use serde::{Deserialize, Serialize};

use crate::clean::clean_text;

/// Opening paragraph of every retrieval-augmented prompt.
pub const RAG_PREAMBLE: &str = "You are a helpful assistant analyzing scientific papers. \
     Based on the following retrieved context, answer the task below.";

const TASK_MARKER: &str = "\n\nTask: ";

/// What the generator is asked to do with the paper text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskSelector {
    #[default]
    Summarize,
    ExtractResearchQuestion,
    ExtractMethod,
    ExtractContribution,
    StructuredSummaryAll,
}

impl TaskSelector {
    pub const ALL: [TaskSelector; 5] = [
        TaskSelector::Summarize,
        TaskSelector::ExtractResearchQuestion,
        TaskSelector::ExtractMethod,
        TaskSelector::ExtractContribution,
        TaskSelector::StructuredSummaryAll,
    ];

    /// Parse a task name leniently.
    ///
    /// Accepts display labels ("Extract Method"), variant names
    /// ("ExtractMethod") and kebab-case ("extract-method"), ignoring case.
    /// Anything else is [`TaskSelector::Summarize`].
    pub fn from_label(label: &str) -> Self {
        let wanted = squash(label);
        Self::ALL
            .into_iter()
            .find(|task| squash(task.label()) == wanted || squash(task.slug()) == wanted)
            .unwrap_or_default()
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        self.profile().label
    }

    /// Kebab-case name used in config files and on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            TaskSelector::Summarize => "summarize",
            TaskSelector::ExtractResearchQuestion => "extract-research-question",
            TaskSelector::ExtractMethod => "extract-method",
            TaskSelector::ExtractContribution => "extract-contribution",
            TaskSelector::StructuredSummaryAll => "structured-summary",
        }
    }

    pub fn profile(self) -> &'static TaskProfile {
        TASK_PROFILES
            .iter()
            .find(|profile| profile.task == self)
            .unwrap_or(&TASK_PROFILES[0])
    }
}

impl From<String> for TaskSelector {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<TaskSelector> for String {
    fn from(task: TaskSelector) -> Self {
        task.slug().to_string()
    }
}

impl std::fmt::Display for TaskSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Instructions and answer-length bounds for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskProfile {
    pub task: TaskSelector,
    pub label: &'static str,

    /// Placed before a single cleaned abstract.
    pub instruction: &'static str,

    /// Placed after `Task: ` at the end of a retrieval prompt.
    pub rag_instruction: &'static str,

    /// Completion length limit.
    pub max_new_tokens: usize,

    /// Extractive answer bounds, in words.
    pub min_words: usize,
    pub max_words: usize,
}

/// Lookup table for every task; the first row is the fallback.
pub static TASK_PROFILES: [TaskProfile; 5] = [
    TaskProfile {
        task: TaskSelector::Summarize,
        label: "Summarize",
        instruction: "Summarize the following scientific abstract in 2-3 sentences, \
            focusing on the method and contribution.",
        rag_instruction: "Summarize the overall approach described.",
        max_new_tokens: 200,
        min_words: 30,
        max_words: 80,
    },
    TaskProfile {
        task: TaskSelector::ExtractResearchQuestion,
        label: "Extract Research Question",
        instruction: "What is the main research question addressed in the following abstract?",
        rag_instruction: "What is the research question these papers are addressing?",
        max_new_tokens: 120,
        min_words: 10,
        max_words: 45,
    },
    TaskProfile {
        task: TaskSelector::ExtractMethod,
        label: "Extract Method",
        instruction: "What method or approach is proposed in the following abstract?",
        rag_instruction: "What methods or techniques are being proposed?",
        max_new_tokens: 160,
        min_words: 15,
        max_words: 60,
    },
    TaskProfile {
        task: TaskSelector::ExtractContribution,
        label: "Extract Contribution",
        instruction: "What is the main contribution of the following research?",
        rag_instruction: "What are the main contributions discussed?",
        max_new_tokens: 160,
        min_words: 15,
        max_words: 60,
    },
    TaskProfile {
        task: TaskSelector::StructuredSummaryAll,
        label: "Structured Summary (All)",
        instruction: "Please read the abstract and provide the following:\n\
            - A short description of the main research question.\n\
            - A brief explanation of the method used.\n\
            - A summary of the main contribution.\n\
            Format each answer as a numbered bullet point.",
        rag_instruction: "Write a structured summary answering:\n\
            - Research Question\n\
            - Method\n\
            - Contribution",
        max_new_tokens: 256,
        min_words: 40,
        max_words: 120,
    },
];

/// Instruction for `task` in single-document mode.
pub fn instruction(task: TaskSelector) -> &'static str {
    task.profile().instruction
}

/// Text a prompt is built around.
#[derive(Debug, Clone, Copy)]
pub enum PromptContext<'a> {
    /// One abstract, answered on its own.
    Document(&'a str),
    /// Ranked chunks from several abstracts, best first.
    Retrieved(&'a [String]),
}

/// Assemble the prompt for `task` over `context`.
pub fn build_prompt(context: PromptContext<'_>, task: TaskSelector) -> String {
    match context {
        PromptContext::Document(text) => build_document_prompt(text, task),
        PromptContext::Retrieved(chunks) => build_rag_prompt(chunks, task),
    }
}

/// `instruction`, a blank line, then the cleaned text.
pub fn build_document_prompt(text: &str, task: TaskSelector) -> String {
    format!("{}\n\n{}", instruction(task), clean_text(text))
}

/// Preamble, numbered contexts in the given order, then the task line.
pub fn build_rag_prompt<S: AsRef<str>>(chunks: &[S], task: TaskSelector) -> String {
    let contexts = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("Context {}:\n{}", i + 1, clean_text(chunk.as_ref())))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{RAG_PREAMBLE}\n\n{contexts}{TASK_MARKER}{}",
        task.profile().rag_instruction
    )
}

/// Recover the paper text from a prompt built by this module, dropping the
/// preamble, instructions, context labels and task line. Prompts from
/// elsewhere come back trimmed but otherwise unchanged.
pub fn source_text(prompt: &str) -> String {
    if let Some(rest) = prompt.strip_prefix(RAG_PREAMBLE) {
        let body = match rest.rfind(TASK_MARKER) {
            Some(end) => &rest[..end],
            None => rest,
        };
        return body
            .split("\n\n")
            .map(|block| match block.split_once('\n') {
                Some((label, text)) if is_context_label(label) => text,
                _ => block,
            })
            .map(str::trim)
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
    }

    TASK_PROFILES
        .iter()
        .find_map(|profile| prompt.strip_prefix(profile.instruction))
        .unwrap_or(prompt)
        .trim()
        .to_string()
}

fn is_context_label(line: &str) -> bool {
    line.strip_prefix("Context ")
        .and_then(|rest| rest.strip_suffix(':'))
        .is_some_and(|n| n.parse::<usize>().is_ok())
}

fn squash(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_task_falls_back_to_summarize() {
        let task = TaskSelector::from_label("Translate to French");
        assert_eq!(task, TaskSelector::Summarize);
        assert_eq!(instruction(task), instruction(TaskSelector::Summarize));
    }

    #[test]
    fn test_label_forms() {
        for label in [
            "Extract Method",
            "ExtractMethod",
            "extract-method",
            "EXTRACT_METHOD",
        ] {
            assert_eq!(TaskSelector::from_label(label), TaskSelector::ExtractMethod);
        }
        assert_eq!(
            TaskSelector::from_label("Structured Summary (All)"),
            TaskSelector::StructuredSummaryAll
        );
        assert_eq!(
            TaskSelector::from_label("structured-summary"),
            TaskSelector::StructuredSummaryAll
        );
    }

    #[test]
    fn test_every_task_has_a_profile() {
        for task in TaskSelector::ALL {
            assert_eq!(task.profile().task, task);
            assert!(task.profile().min_words <= task.profile().max_words);
            assert_eq!(TaskSelector::from_label(task.label()), task);
            assert_eq!(TaskSelector::from_label(task.slug()), task);
        }
    }

    #[test]
    fn test_document_prompt() {
        let prompt = build_document_prompt(
            "We  propose \\textbf{X}.",
            TaskSelector::ExtractContribution,
        );
        assert_eq!(
            prompt,
            "What is the main contribution of the following research?\n\nWe propose X."
        );
    }

    #[test]
    fn test_rag_prompt_layout() {
        let chunks = vec!["First chunk.".to_string(), "Second $x$ chunk.".to_string()];

        let prompt = build_prompt(PromptContext::Retrieved(&chunks), TaskSelector::Summarize);

        assert_eq!(
            prompt,
            format!(
                "{RAG_PREAMBLE}\n\nContext 1:\nFirst chunk.\n\nContext 2:\nSecond chunk.\n\n\
                 Task: Summarize the overall approach described."
            )
        );
        let first = prompt.find("Context 1:").unwrap();
        let second = prompt.find("Context 2:").unwrap();
        let task = prompt.find("\nTask: ").unwrap();
        assert!(first < second && second < task);
    }

    #[test]
    fn test_rag_prompt_unknown_task() {
        let chunks = vec!["Only chunk.".to_string()];
        let prompt = build_rag_prompt(&chunks, TaskSelector::from_label("??"));
        assert!(prompt.ends_with("Task: Summarize the overall approach described."));
    }

    #[test]
    fn test_source_text_from_document_prompt() {
        let prompt =
            build_document_prompt("A study of graphs.", TaskSelector::StructuredSummaryAll);
        assert_eq!(source_text(&prompt), "A study of graphs.");
    }

    #[test]
    fn test_source_text_from_rag_prompt() {
        let chunks = vec!["Alpha one.".to_string(), "Beta two.".to_string()];
        let prompt = build_rag_prompt(&chunks, TaskSelector::StructuredSummaryAll);
        assert_eq!(source_text(&prompt), "Alpha one. Beta two.");
    }

    #[test]
    fn test_source_text_passthrough() {
        assert_eq!(source_text("  free text  "), "free text");
    }

    #[test]
    fn test_serde_uses_lenient_labels() {
        #[derive(Deserialize, Serialize)]
        struct Wrapper {
            task: TaskSelector,
        }

        let parsed: Wrapper = serde_json::from_str(r#"{"task":"Extract Method"}"#).unwrap();
        assert_eq!(parsed.task, TaskSelector::ExtractMethod);
        let parsed: Wrapper = serde_json::from_str(r#"{"task":"nonsense"}"#).unwrap();
        assert_eq!(parsed.task, TaskSelector::Summarize);
        assert_eq!(
            serde_json::to_string(&Wrapper {
                task: TaskSelector::ExtractContribution
            })
            .unwrap(),
            r#"{"task":"extract-contribution"}"#
        );
    }
}

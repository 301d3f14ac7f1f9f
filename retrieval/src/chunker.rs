//! Sentence-window chunking for retrieval.
//!
//! Abstracts are short, so chunks are cut on sentence boundaries rather than
//! token counts: every chunk holds `chunk_size` consecutive sentences and
//! windows do not overlap.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};

/// Sentences per chunk when nothing else is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 2;

/// A window of consecutive sentences taken from one source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk within the batch it was produced in.
    pub id: usize,

    /// Whitespace-normalized text, never empty.
    pub content: String,

    /// Number of sentences the chunk holds.
    pub sentence_count: usize,
}

/// Splits normalized text into sentences.
pub trait SentenceSplitter: Send + Sync {
    /// Return the sentences of `text` in order. `text` has already had its
    /// whitespace collapsed.
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// Cuts after `.`, `!` or `?` when followed by a space.
///
/// Abbreviations ("e.g. this"), decimals followed by a space and quoted
/// punctuation all produce extra boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveSentenceSplitter;

impl SentenceSplitter for NaiveSentenceSplitter {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut prev_terminal = false;

        for (i, c) in text.char_indices() {
            if c == ' ' && prev_terminal {
                sentences.push(&text[start..i]);
                start = i + 1;
            }
            prev_terminal = matches!(c, '.' | '!' | '?');
        }
        if start < text.len() {
            sentences.push(&text[start..]);
        }

        sentences
    }
}

/// Groups sentences into fixed-size windows.
pub struct SentenceChunker<S = NaiveSentenceSplitter> {
    splitter: S,
    chunk_size: usize,
}

impl SentenceChunker {
    /// Create a chunker using the naive splitter.
    pub fn new(chunk_size: usize) -> Result<Self> {
        Self::with_splitter(NaiveSentenceSplitter, chunk_size)
    }
}

impl<S: SentenceSplitter> SentenceChunker<S> {
    /// Create a chunker with a custom sentence splitter.
    pub fn with_splitter(splitter: S, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RetrievalError::InvalidArgument(
                "chunk_size must be positive".to_string(),
            ));
        }
        Ok(Self {
            splitter,
            chunk_size,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Chunk `text`. Empty or whitespace-only input yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return Vec::new();
        }

        let sentences = self.splitter.split(&normalized);
        sentences
            .chunks(self.chunk_size)
            .filter_map(|window| {
                let content = window.join(" ").trim().to_string();
                if content.is_empty() {
                    None
                } else {
                    Some((content, window.len()))
                }
            })
            .enumerate()
            .map(|(id, (content, sentence_count))| Chunk {
                id,
                content,
                sentence_count,
            })
            .collect()
    }
}

/// Chunk `text` into windows of `chunk_size` sentences with the naive splitter.
pub fn chunk_text(text: &str, chunk_size: usize) -> Result<Vec<Chunk>> {
    Ok(SentenceChunker::new(chunk_size)?.chunk(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn contents(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.content.as_str()).collect()
    }

    #[test]
    fn test_splits_on_terminal_punctuation() {
        let sentences = NaiveSentenceSplitter.split("One. Two! Three? Four");
        assert_eq!(sentences, vec!["One.", "Two!", "Three?", "Four"]);
    }

    #[test]
    fn test_no_split_without_following_space() {
        let sentences = NaiveSentenceSplitter.split("Accuracy is 0.95 overall. Done.");
        assert_eq!(sentences, vec!["Accuracy is 0.95 overall.", "Done."]);
    }

    #[test]
    fn test_windows_of_two() {
        let chunks = chunk_text("A one. B two. C three. D four. E five.", 2).unwrap();

        assert_eq!(
            contents(&chunks),
            vec!["A one. B two.", "C three. D four.", "E five."]
        );
        assert_eq!(
            chunks.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_sentence_counts_sum_to_total() {
        let text = "First sentence. Second one! Third? Fourth. Fifth. Sixth. Seventh.";
        for size in 1..=8 {
            let chunks = chunk_text(text, size).unwrap();
            let total: usize = chunks.iter().map(|c| c.sentence_count).sum();
            assert_eq!(total, 7, "chunk_size {size}");
            assert!(chunks.iter().all(|c| c.sentence_count <= size));
        }
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let chunks = chunk_text("  Spread\n over   lines.\n\nNext\tone.  ", 1).unwrap();
        assert_eq!(contents(&chunks), vec!["Spread over lines.", "Next one."]);
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_text("", 2).unwrap().is_empty());
        assert!(chunk_text("   \n\t ", 2).unwrap().is_empty());
    }

    #[test]
    fn test_zero_chunk_size() {
        assert!(matches!(
            chunk_text("Some text.", 0),
            Err(RetrievalError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_no_empty_chunks() {
        let chunks = chunk_text("Ends here. ", 3).unwrap();
        assert_eq!(contents(&chunks), vec!["Ends here."]);
        assert!(chunks.iter().all(|c| !c.content.is_empty()));
    }

    #[test]
    fn test_custom_splitter() {
        struct Semicolons;
        impl SentenceSplitter for Semicolons {
            fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
                text.split(';').map(str::trim).collect()
            }
        }

        let chunker = SentenceChunker::with_splitter(Semicolons, 2).unwrap();
        let chunks = chunker.chunk("a; b; c");
        assert_eq!(contents(&chunks), vec!["a b", "c"]);
    }
}

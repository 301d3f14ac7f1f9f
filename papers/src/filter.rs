//! Keyword filtering over fetched papers.

use crate::model::PaperRecord;

/// Keep papers whose title or abstract contains `keyword` (case-insensitive
/// substring), in input order, at most `top_k` of them.
///
/// An empty keyword matches every paper.
pub fn keyword_filter(papers: Vec<PaperRecord>, keyword: &str, top_k: usize) -> Vec<PaperRecord> {
    let keyword = keyword.to_lowercase();
    papers
        .into_iter()
        .filter(|paper| {
            paper.title.to_lowercase().contains(&keyword)
                || paper.abstract_text.to_lowercase().contains(&keyword)
        })
        .take(top_k)
        .collect()
}

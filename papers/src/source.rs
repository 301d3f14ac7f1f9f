//! The discovery interface.

use async_trait::async_trait;
use tracing::debug;

use crate::category::DEFAULT_CATEGORIES;
use crate::error::Result;
use crate::model::PaperRecord;

/// Source of recent paper metadata.
///
/// Implementations fetch one category at a time; [`PaperSource::fetch_recent`]
/// adds the "no category means the default set" rule on top.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Fetch up to `max_results` papers from `category` published within the
    /// last `days_back` days, newest first.
    async fn fetch_category(
        &self,
        category: &str,
        max_results: usize,
        days_back: u32,
    ) -> Result<Vec<PaperRecord>>;

    /// Categories searched when no category is selected.
    fn default_categories(&self) -> &[&str] {
        DEFAULT_CATEGORIES
    }

    /// Fetch recent papers from `category`, or from every default category
    /// (each with `max_results`, concatenated in order) when `category` is
    /// `None`.
    async fn fetch_recent(
        &self,
        category: Option<&str>,
        max_results: usize,
        days_back: u32,
    ) -> Result<Vec<PaperRecord>> {
        match category {
            Some(category) => self.fetch_category(category, max_results, days_back).await,
            None => {
                let mut combined = Vec::new();
                for category in self.default_categories() {
                    let papers = self.fetch_category(category, max_results, days_back).await?;
                    debug!("{}: {} papers from {category}", self.name(), papers.len());
                    combined.extend(papers);
                }
                Ok(combined)
            }
        }
    }
}

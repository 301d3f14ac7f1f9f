//! Paper metadata as returned by discovery.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for one paper. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Paper title, on one line.
    pub title: String,

    /// Abstract text, on one line.
    #[serde(rename = "abstract")]
    pub abstract_text: String,

    /// Author names in listed order.
    pub authors: Vec<String>,

    /// Publication timestamp.
    pub published: DateTime<Utc>,

    /// Link to the abstract page.
    pub link: String,
}

impl PaperRecord {
    /// Publication date (UTC).
    pub fn published_date(&self) -> NaiveDate {
        self.published.date_naive()
    }

    /// Authors joined with commas, for display.
    pub fn author_line(&self) -> String {
        self.authors.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_helpers() {
        let paper = PaperRecord {
            title: "A".to_string(),
            abstract_text: "B".to_string(),
            authors: vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()],
            published: Utc.with_ymd_and_hms(2025, 3, 4, 23, 59, 0).unwrap(),
            link: "http://arxiv.org/abs/2503.00001v1".to_string(),
        };

        assert_eq!(paper.author_line(), "Ada Lovelace, Alan Turing");
        assert_eq!(paper.published_date().to_string(), "2025-03-04");
    }
}

//! arXiv API client.
//!
//! Endpoint used:
//!   query: http://export.arxiv.org/api/query (Atom 1.0 feed)

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, info, instrument, warn};

use crate::error::{PaperError, Result};
use crate::model::PaperRecord;
use crate::source::PaperSource;

/// Default arXiv query endpoint.
pub const DEFAULT_ARXIV_URL: &str = "http://export.arxiv.org/api/query";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the arXiv Atom API.
pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ArxivClient {
    /// Create a client for the public arXiv endpoint.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_ARXIV_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the query endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch the raw Atom feed for a category, newest submissions first.
    #[instrument(skip(self))]
    async fn fetch_feed(&self, category: &str, max_results: usize) -> Result<String> {
        let params = [
            ("search_query", format!("cat:{category}")),
            ("start", "0".to_string()),
            ("max_results", max_results.to_string()),
            ("sortBy", "submittedDate".to_string()),
            ("sortOrder", "descending".to_string()),
        ];

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PaperError::Api { status, body });
        }

        Ok(response.text().await?)
    }
}

impl Default for ArxivClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    fn name(&self) -> &str {
        "arxiv"
    }

    async fn fetch_category(
        &self,
        category: &str,
        max_results: usize,
        days_back: u32,
    ) -> Result<Vec<PaperRecord>> {
        let xml = self.fetch_feed(category, max_results).await?;
        let papers = parse_atom_feed(&xml)?;
        let total = papers.len();
        let recent = retain_recent(papers, Utc::now(), days_back);

        info!(
            "arXiv {category}: {} of {total} entries within {days_back} days",
            recent.len()
        );
        Ok(recent)
    }
}

/// Drop papers published more than `days_back` days before `now`.
pub fn retain_recent(
    papers: Vec<PaperRecord>,
    now: DateTime<Utc>,
    days_back: u32,
) -> Vec<PaperRecord> {
    let cutoff = now - TimeDelta::days(i64::from(days_back));
    papers
        .into_iter()
        .filter(|paper| paper.published >= cutoff)
        .collect()
}

/// Which text field of an entry is being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Id,
    Title,
    Summary,
    Published,
    AuthorName,
}

/// Entry under construction.
#[derive(Default)]
struct EntryBuilder {
    id: String,
    title: String,
    summary: String,
    published: String,
    authors: Vec<String>,
    author_name: String,
    alternate_link: Option<String>,
    first_link: Option<String>,
}

impl EntryBuilder {
    fn push_text(&mut self, field: Field, text: &str) {
        match field {
            Field::Id => self.id.push_str(text),
            Field::Title => self.title.push_str(text),
            Field::Summary => self.summary.push_str(text),
            Field::Published => self.published.push_str(text),
            Field::AuthorName => self.author_name.push_str(text),
            Field::None => {}
        }
    }

    fn read_link(&mut self, element: &BytesStart<'_>) {
        let mut href = None;
        let mut rel = None;
        for attr in element.attributes().flatten() {
            let value = attr.unescape_value().map(|v| v.into_owned()).ok();
            match attr.key.as_ref() {
                b"href" => href = value,
                b"rel" => rel = value,
                _ => {}
            }
        }

        let Some(href) = href else { return };
        if self.first_link.is_none() {
            self.first_link = Some(href.clone());
        }
        if rel.as_deref() == Some("alternate") && self.alternate_link.is_none() {
            self.alternate_link = Some(href);
        }
    }

    fn finish(self) -> Option<PaperRecord> {
        let published = match DateTime::parse_from_rfc3339(self.published.trim()) {
            Ok(published) => published.with_timezone(&Utc),
            Err(e) => {
                warn!("Skipping entry {} with bad published date: {e}", self.id.trim());
                return None;
            }
        };

        let title = one_line(&self.title);
        if title.is_empty() {
            warn!("Skipping entry {} with empty title", self.id.trim());
            return None;
        }

        let link = self
            .alternate_link
            .or(self.first_link)
            .unwrap_or_else(|| self.id.trim().to_string());

        Some(PaperRecord {
            title,
            abstract_text: one_line(&self.summary),
            authors: self.authors,
            published,
            link,
        })
    }
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse an arXiv Atom feed into paper records, in feed order.
///
/// Entries without a parseable `<published>` timestamp or with an empty
/// title are skipped.
pub fn parse_atom_feed(xml: &str) -> Result<Vec<PaperRecord>> {
    let mut papers = Vec::new();
    let mut reader = Reader::from_str(xml);

    let mut current: Option<EntryBuilder> = None;
    let mut field = Field::None;
    let mut in_author = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"entry" => current = Some(EntryBuilder::default()),
                b"id" if current.is_some() => field = Field::Id,
                b"title" if current.is_some() => field = Field::Title,
                b"summary" if current.is_some() => field = Field::Summary,
                b"published" if current.is_some() => field = Field::Published,
                b"author" if current.is_some() => {
                    in_author = true;
                    if let Some(entry) = current.as_mut() {
                        entry.author_name.clear();
                    }
                }
                b"name" if in_author => field = Field::AuthorName,
                b"link" => {
                    if let Some(entry) = current.as_mut() {
                        entry.read_link(e);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"link" {
                    if let Some(entry) = current.as_mut() {
                        entry.read_link(e);
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(entry) = current.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| PaperError::Feed(err.to_string()))?;
                    entry.push_text(field, &text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(entry) = current.as_mut() {
                    entry.push_text(field, &String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"id" | b"title" | b"summary" | b"published" | b"name" => field = Field::None,
                b"author" => {
                    in_author = false;
                    if let Some(entry) = current.as_mut() {
                        let name = one_line(&entry.author_name);
                        if !name.is_empty() {
                            entry.authors.push(name);
                        }
                    }
                }
                b"entry" => {
                    if let Some(paper) = current.take().and_then(EntryBuilder::finish) {
                        papers.push(paper);
                    }
                    field = Field::None;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PaperError::Feed(format!(
                    "at byte {}: {e}",
                    reader.error_position()
                )));
            }
            _ => {}
        }
    }

    debug!("Parsed {} entries from Atom feed", papers.len());
    Ok(papers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=cat:cs.CV</title>
  <id>http://arxiv.org/api/abc</id>
  <entry>
    <id>http://arxiv.org/abs/2501.00001v1</id>
    <updated>2025-01-10T18:00:00Z</updated>
    <published>2025-01-10T18:00:00Z</published>
    <title>Monocular 3D Pose
      Estimation with Transformers</title>
    <summary>  We propose a method for pose estimation.
Results &amp; code are public.
</summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name><arxiv:affiliation>Bletchley</arxiv:affiliation></author>
    <link href="http://arxiv.org/abs/2501.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2501.00001v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="cs.CV"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2412.09999v2</id>
    <published>2024-12-20T09:30:00Z</published>
    <title>Older Paper</title>
    <summary>Graph neural networks.</summary>
    <author><name>Grace Hopper</name></author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/bad</id>
    <published>yesterday</published>
    <title>Broken Date</title>
    <summary>Skipped.</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_atom_feed() {
        let papers = parse_atom_feed(FEED).unwrap();

        assert_eq!(papers.len(), 2);
        let first = &papers[0];
        assert_eq!(first.title, "Monocular 3D Pose Estimation with Transformers");
        assert_eq!(
            first.abstract_text,
            "We propose a method for pose estimation. Results & code are public."
        );
        assert_eq!(first.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(first.link, "http://arxiv.org/abs/2501.00001v1");
        assert_eq!(
            first.published,
            Utc.with_ymd_and_hms(2025, 1, 10, 18, 0, 0).unwrap()
        );

        // No <link>: falls back to the entry id.
        assert_eq!(papers[1].link, "http://arxiv.org/abs/2412.09999v2");
    }

    #[test]
    fn test_feed_title_is_not_an_entry() {
        let papers = parse_atom_feed(FEED).unwrap();
        assert!(papers.iter().all(|p| !p.title.starts_with("ArXiv Query")));
    }

    #[test]
    fn test_malformed_feed() {
        let err = parse_atom_feed("<feed><entry><title>x</summary></entry></feed>").unwrap_err();
        assert!(matches!(err, PaperError::Feed(_)));
    }

    #[test]
    fn test_retain_recent() {
        let papers = parse_atom_feed(FEED).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 14, 0, 0, 0).unwrap();

        let recent = retain_recent(papers.clone(), now, 7);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].title, "Monocular 3D Pose Estimation with Transformers");

        assert_eq!(retain_recent(papers, now, 60).len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_category_queries_arxiv() {
        let server = MockServer::start().await;
        let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let feed = format!(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>
<id>http://arxiv.org/abs/1</id><published>{now}</published>
<title>Fresh</title><summary>New work.</summary>
<author><name>A. Author</name></author></entry></feed>"#
        );

        Mock::given(method("GET"))
            .and(query_param("search_query", "cat:cs.CV"))
            .and(query_param("max_results", "25"))
            .and(query_param("sortBy", "submittedDate"))
            .and(query_param("sortOrder", "descending"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed))
            .mount(&server)
            .await;

        let client = ArxivClient::new().with_base_url(format!("{}/api/query", server.uri()));
        let papers = client.fetch_category("cs.CV", 25, 7).await.unwrap();

        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, "Fresh");
        assert_eq!(papers[0].link, "http://arxiv.org/abs/1");
    }

    #[tokio::test]
    async fn test_fetch_category_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let client = ArxivClient::new().with_base_url(server.uri());
        let err = client.fetch_category("cs.LG", 10, 7).await.unwrap_err();

        assert!(matches!(err, PaperError::Api { status: 503, .. }));
    }
}

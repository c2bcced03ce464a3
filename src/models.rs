//! Data models for crawl requests, article records and storage sessions.
//!
//! - [`ArticleRequest`]: an article page scheduled for fetching
//! - [`ArticleRecord`]: the structured record extracted from one article page
//! - [`ScrapeSession`]: every record produced by one spider run, as stored

use crate::index::Index;
use serde::{Deserialize, Serialize};

/// An article page that passed the duplicate filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRequest {
    /// Absolute URL of the article page.
    pub url: String,
    /// Index derived from the URL path.
    pub index: Index,
}

/// One scraped article.
///
/// Field order is the storage column order: url, header, tags, text, date,
/// index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// Final URL of the article page.
    pub url: String,
    pub header: String,
    pub tags: Vec<String>,
    /// Reconstructed article text with inlined links and media summary.
    pub text: String,
    /// Publication date when the site exposes one, scrape time otherwise.
    pub date: String,
    pub index: Index,
}

/// Everything one spider run produced.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapeSession {
    /// Spider name.
    pub spider: String,
    /// Start of the run, RFC 3339.
    pub started_at: String,
    /// End of the run, RFC 3339.
    pub finished_at: String,
    /// Rendered open line, when enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_line: Option<String>,
    /// Rendered close line, when enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_line: Option<String>,
    pub articles: Vec<ArticleRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ArticleRecord {
        ArticleRecord {
            url: "https://www.gismeteo.ua/news/climate/123-heat/".to_string(),
            header: "Heat".to_string(),
            tags: vec!["heat".to_string()],
            text: "Hot.".to_string(),
            date: "01.07 Mon 10:00".to_string(),
            index: Index::new("123"),
        }
    }

    #[test]
    fn test_record_serializes_in_column_order() {
        let json = serde_json::to_string(&record()).unwrap();
        let positions: Vec<usize> = ["\"url\"", "\"header\"", "\"tags\"", "\"text\"", "\"date\"", "\"index\""]
            .iter()
            .map(|key| json.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(json.contains(r#""index":"123""#));
    }

    #[test]
    fn test_session_deserialization_without_lines() {
        let json = r#"{
            "spider": "gismeteo_ua",
            "started_at": "2025-05-06T10:00:00+00:00",
            "finished_at": "2025-05-06T10:05:00+00:00",
            "articles": []
        }"#;
        let session: ScrapeSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.spider, "gismeteo_ua");
        assert!(session.open_line.is_none());
        assert!(session.articles.is_empty());
    }
}

//! Storage sessions: the records of one spider run plus its open/close lines.

use crate::config::StorageSettings;
use crate::models::{ArticleRecord, ScrapeSession};
use chrono::{DateTime, Local};
use tracing::debug;

/// Collects the records of one spider run.
#[derive(Debug)]
pub struct StorageSession<'a> {
    spider: String,
    settings: &'a StorageSettings,
    started_at: DateTime<Local>,
    open_line: Option<String>,
    rows: Vec<ArticleRecord>,
}

impl<'a> StorageSession<'a> {
    /// Start a session; renders the open line when enabled.
    pub fn open(spider: &str, settings: &'a StorageSettings) -> Self {
        let started_at = Local::now();
        let open_line = settings.open_line.then(|| {
            settings
                .open_format
                .replace("{date}", &started_at.format(&settings.date_format).to_string())
                .replace("{name}", spider)
        });
        debug!(%spider, "Storage session opened");
        Self {
            spider: spider.to_string(),
            settings,
            started_at,
            open_line,
            rows: Vec::new(),
        }
    }

    pub fn append(&mut self, record: ArticleRecord) {
        self.rows.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = ArticleRecord>) {
        for record in records {
            self.append(record);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Finish the session; renders the close line when enabled.
    pub fn close(self) -> ScrapeSession {
        let finished_at = Local::now();
        let close_line = self.settings.close_line.then(|| {
            self.settings
                .close_format
                .replace("{date}", &finished_at.format(&self.settings.date_format).to_string())
                .replace("{count}", &self.rows.len().to_string())
        });
        debug!(spider = %self.spider, count = self.rows.len(), "Storage session closed");
        ScrapeSession {
            spider: self.spider,
            started_at: self.started_at.to_rfc3339(),
            finished_at: finished_at.to_rfc3339(),
            open_line: self.open_line,
            close_line,
            articles: self.rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Index;

    fn record(index: &str) -> ArticleRecord {
        ArticleRecord {
            url: format!("https://example.org/{index}/"),
            header: "h".to_string(),
            tags: vec![],
            text: "t".to_string(),
            date: "d".to_string(),
            index: Index::new(index),
        }
    }

    #[test]
    fn test_session_lines() {
        let settings = StorageSettings {
            date_format: "DATE".to_string(),
            ..StorageSettings::default()
        };
        let mut session = StorageSession::open("gismeteo_ua", &settings);
        session.append(record("1"));
        session.extend([record("2"), record("3")]);
        assert_eq!(session.len(), 3);

        let stored = session.close();
        assert_eq!(stored.open_line.as_deref(), Some(r#"DATE / START "gismeteo_ua" spider"#));
        assert_eq!(stored.close_line.as_deref(), Some("DATE / 3 articles scraped"));
        assert_eq!(stored.articles.len(), 3);
    }

    #[test]
    fn test_session_lines_disabled() {
        let settings = StorageSettings {
            open_line: false,
            close_line: false,
            ..StorageSettings::default()
        };
        let stored = StorageSession::open("s", &settings).close();
        assert!(stored.open_line.is_none());
        assert!(stored.close_line.is_none());
    }
}

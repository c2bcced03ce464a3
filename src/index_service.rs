//! Sources of already-scraped indexes.
//!
//! [`IndexService::fetch_known_indexes`] is called once per spider run,
//! before any link is filtered. Its result is never updated during the run.

use crate::index::{Index, ScrapedIndexSet};
use crate::models::ScrapeSession;
use chrono::{Duration, Local, NaiveDate};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// How many days of stored sessions the archive source looks back.
pub const ARCHIVE_LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub enum IndexService {
    /// Session files written by earlier runs under this output directory.
    Archive { output_dir: PathBuf, lookback_days: i64 },
    /// An HTTP endpoint returning a JSON array of index strings. `{spider}`
    /// in the URL is replaced with the spider name.
    Http { url: String, client: reqwest::Client },
    /// Deduplication switched off.
    Disabled,
}

impl IndexService {
    pub fn archive(output_dir: impl Into<PathBuf>) -> Self {
        Self::Archive {
            output_dir: output_dir.into(),
            lookback_days: ARCHIVE_LOOKBACK_DAYS,
        }
    }

    pub fn http(url: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    #[instrument(level = "info", skip(self))]
    pub async fn fetch_known_indexes(&self, spider: &str) -> Result<ScrapedIndexSet, Box<dyn Error>> {
        let known = match self {
            Self::Archive {
                output_dir,
                lookback_days,
            } => {
                let since = Local::now().date_naive() - Duration::days(*lookback_days);
                read_archive(output_dir, spider, since).await?
            }
            Self::Http { url, client } => {
                let url = url.replace("{spider}", spider);
                let indexes: Vec<String> = client
                    .get(&url)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                indexes.into_iter().map(Index::new).collect()
            }
            Self::Disabled => ScrapedIndexSet::new(),
        };
        info!(count = known.len(), "Loaded scraped indexes");
        Ok(known)
    }
}

/// Collect the indexes of every stored session of `spider` dated `since` or
/// later. A missing output directory is an empty archive.
async fn read_archive(
    output_dir: &Path,
    spider: &str,
    since: NaiveDate,
) -> Result<ScrapedIndexSet, Box<dyn Error>> {
    if !fs::try_exists(output_dir).await? {
        debug!(dir = %output_dir.display(), "No archive yet");
        return Ok(ScrapedIndexSet::new());
    }

    let prefix = format!("{spider}_");
    let mut indexes = Vec::new();
    let mut days = fs::read_dir(output_dir).await?;
    while let Some(day) = days.next_entry().await? {
        let recent = day
            .file_name()
            .to_str()
            .and_then(|name| NaiveDate::parse_from_str(name, "%Y-%m-%d").ok())
            .is_some_and(|date| date >= since);
        if !recent || !day.file_type().await?.is_dir() {
            continue;
        }

        let mut sessions = fs::read_dir(day.path()).await?;
        while let Some(session) = sessions.next_entry().await? {
            let name = session.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(&prefix) || !name.ends_with(".json") {
                continue;
            }
            let raw = fs::read_to_string(session.path()).await?;
            match serde_json::from_str::<ScrapeSession>(&raw) {
                Ok(stored) => indexes.extend(stored.articles.into_iter().map(|a| a.index)),
                Err(e) => warn!(path = %session.path().display(), error = %e, "Skipping unreadable session file"),
            }
        }
    }
    Ok(indexes.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleRecord;

    fn session(spider: &str, indexes: &[&str]) -> String {
        let session = ScrapeSession {
            spider: spider.to_string(),
            started_at: "2025-05-06T10:00:00+00:00".to_string(),
            finished_at: "2025-05-06T10:01:00+00:00".to_string(),
            open_line: None,
            close_line: None,
            articles: indexes
                .iter()
                .map(|i| ArticleRecord {
                    url: format!("https://example.org/news/{i}-x/"),
                    header: String::new(),
                    tags: vec![],
                    text: String::new(),
                    date: String::new(),
                    index: Index::new(*i),
                })
                .collect(),
        };
        serde_json::to_string(&session).unwrap()
    }

    #[tokio::test]
    async fn test_archive_reads_recent_sessions_of_spider() {
        let dir = tempfile::tempdir().unwrap();
        let today = Local::now().date_naive();
        let old = today - Duration::days(30);

        let today_dir = dir.path().join(today.format("%Y-%m-%d").to_string());
        let old_dir = dir.path().join(old.format("%Y-%m-%d").to_string());
        std::fs::create_dir_all(&today_dir).unwrap();
        std::fs::create_dir_all(&old_dir).unwrap();

        std::fs::write(today_dir.join("gismeteo_ua_10-00-00.json"), session("gismeteo_ua", &["1", "2"])).unwrap();
        std::fs::write(today_dir.join("gismeteo_ru_10-00-00.json"), session("gismeteo_ru", &["3"])).unwrap();
        std::fs::write(today_dir.join("gismeteo_ua_broken.json"), "{not json").unwrap();
        std::fs::write(old_dir.join("gismeteo_ua_10-00-00.json"), session("gismeteo_ua", &["4"])).unwrap();

        let known = IndexService::archive(dir.path())
            .fetch_known_indexes("gismeteo_ua")
            .await
            .unwrap();
        assert_eq!(known.len(), 2);
        assert!(known.contains(&Index::new("1")));
        assert!(known.contains(&Index::new("2")));
        assert!(!known.contains(&Index::new("3")));
        assert!(!known.contains(&Index::new("4")));
    }

    #[tokio::test]
    async fn test_archive_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let known = IndexService::archive(dir.path().join("missing"))
            .fetch_known_indexes("gismeteo_ua")
            .await
            .unwrap();
        assert!(known.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_is_empty() {
        let known = IndexService::Disabled.fetch_known_indexes("any").await.unwrap();
        assert!(known.is_empty());
    }
}

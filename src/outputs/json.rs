//! JSON output of storage sessions.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── 2025-05-06/
//!     ├── gismeteo_ua_10-00-03.json
//!     └── gismeteo_ru_10-02-41.json
//! ```
//!
//! The archive index service reads these files back to skip articles
//! scraped during the previous week.

use crate::models::ScrapeSession;
use chrono::{DateTime, Local};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Path of a session file for `spider` finished at `at`.
pub fn session_path(output_dir: &Path, spider: &str, at: DateTime<Local>) -> PathBuf {
    output_dir
        .join(at.format("%Y-%m-%d").to_string())
        .join(format!("{spider}_{}.json", at.format("%H-%M-%S")))
}

/// Write a [`ScrapeSession`] under its date directory.
///
/// # Returns
///
/// The path written to.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), spider = %session.spider))]
pub async fn write_session(
    session: &ScrapeSession,
    output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(session)?;

    let finished_at = DateTime::parse_from_rfc3339(&session.finished_at)
        .map(|at| at.with_timezone(&Local))
        .unwrap_or_else(|_| Local::now());
    let path = session_path(output_dir, &session.spider, finished_at);

    if let Some(dir) = path.parent() {
        info!(dir = %dir.display(), "Ensuring JSON directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = session.articles.len(), "Wrote session file");
    Ok(path)
}

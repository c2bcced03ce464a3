//! YAML configuration.
//!
//! The configuration is loaded once at startup and handed to every component
//! that needs it. Spider fields without a serde default are required: a
//! missing one fails the load with [`ConfigError::Parse`] before any page is
//! fetched. Any field extractor can be switched off with the literal
//! `disabled`.
//!
//! ```yaml
//! spiders:
//!   - name: gismeteo_ua
//!     scheme: https
//!     domain: www.gismeteo.ua
//!     start_path: news/
//!     index: { rule: segment_prefix, delimiter: "-" }
//!     links: ["div.item__title > a::attr(href)"]
//!     header: "div.article__h > h1::text"
//!     tags: disabled
//!     text:
//!       body: { parent: div.article__i, child: div }
//!       blocks: { hyperlink: a, photo: "div.pic-descr::text", video: div.pic, iframe: iframe }
//! ```

use crate::error::ConfigError;
use crate::extract::TextFormat;
use crate::extract::children::ProbePolicy;
use chrono::format::{Item, StrftimeItems};
use crate::index::IndexRuleConfig;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

/// Root of the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlSettings,
    #[serde(default)]
    pub format: TextFormat,
    #[serde(default)]
    pub storage: StorageSettings,
    pub spiders: Vec<SpiderConfig>,
}

/// HTTP and scheduling settings shared by all spiders.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
    /// Article pages fetched at the same time.
    pub concurrency: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("climate_scraper/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            concurrency: 8,
        }
    }
}

/// Session line templates. `open_format` understands `{date}` and `{name}`,
/// `close_format` understands `{date}` and `{count}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// chrono `strftime` format for session lines and fallback article dates.
    pub date_format: String,
    pub open_format: String,
    pub close_format: String,
    pub open_line: bool,
    pub close_line: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            date_format: "%d.%m %a %H:%M".to_string(),
            open_format: r#"{date} / START "{name}" spider"#.to_string(),
            close_format: "{date} / {count} articles scraped".to_string(),
            open_line: true,
            close_line: true,
        }
    }
}

/// Marker for a switched-off field: the YAML string `disabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Off {
    Disabled,
}

/// A field definition that may be switched off.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Toggle<T> {
    Off(Off),
    On(T),
}

impl<T> Default for Toggle<T> {
    fn default() -> Self {
        Self::Off(Off::Disabled)
    }
}

impl<T> Toggle<T> {
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Self::Off(_) => None,
            Self::On(value) => Some(value),
        }
    }
}

/// One site.
#[derive(Debug, Clone, Deserialize)]
pub struct SpiderConfig {
    pub name: String,
    /// `http` or `https`.
    pub scheme: String,
    pub domain: String,
    /// Path of the news-list page, without the leading slash.
    pub start_path: String,
    pub index: IndexRuleConfig,
    /// Link patterns on the news-list page, evaluated in order.
    pub links: Toggle<Vec<String>>,
    pub header: Toggle<String>,
    pub tags: Toggle<String>,
    #[serde(default)]
    pub date: Toggle<String>,
    pub text: Toggle<TextConfig>,
}

/// Article body definition.
#[derive(Debug, Clone, Deserialize)]
pub struct TextConfig {
    pub body: BodyConfig,
    #[serde(default)]
    pub probe: ProbePolicy,
    pub blocks: BlockGrammarConfig,
}

/// `parent > child:nth-child(i):not(exclude)`
#[derive(Debug, Clone, Deserialize)]
pub struct BodyConfig {
    pub parent: String,
    pub child: String,
    #[serde(default)]
    pub exclude: Option<String>,
}

/// Block classification patterns, matched against a block's direct children.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockGrammarConfig {
    pub hyperlink: String,
    pub photo: String,
    pub video: String,
    pub iframe: String,
    /// Regexes matched against a block's direct text.
    #[serde(default)]
    pub trash: Vec<String>,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        validate_date_format(&config.storage.date_format)?;
        Ok(config)
    }

    /// The spiders to run: all of them when `names` is empty.
    pub fn select_spiders(&self, names: &[String]) -> Result<Vec<&SpiderConfig>, ConfigError> {
        if names.is_empty() {
            return Ok(self.spiders.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                self.spiders
                    .iter()
                    .find(|spider| &spider.name == name)
                    .ok_or_else(|| ConfigError::UnknownSpider(name.clone()))
            })
            .collect()
    }
}

/// Reject `strftime` strings chrono cannot render.
pub fn validate_date_format(format: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::DateFormat(format.to_string()));
    }
    Ok(())
}

/// Read and parse the configuration file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let config = Config::from_yaml(&yaml)?;
    info!(spiders = config.spiders.len(), "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r##"
crawl:
  concurrency: 2
format:
  photo: "[фото]"
spiders:
  - name: gismeteo_ua
    scheme: https
    domain: www.gismeteo.ua
    start_path: news/
    index: { rule: segment_prefix, delimiter: "-" }
    links:
      - "div.item__title > a::attr(href)"
      - "div.container-img > a::attr(href)"
    header: "div.article__h > h1::text"
    tags: "div.article__tags > a::text"
    text: &gismeteo_text
      body: { parent: div.article__i, child: div, exclude: "#fb-root" }
      probe: { policy: skip_leading_empties, limit: 4 }
      blocks:
        hyperlink: a
        photo: "div.pic-descr::text"
        video: div.pic
        iframe: iframe
        trash: ["(?i)subscribe"]
  - name: gismeteo_ru
    scheme: https
    domain: www.gismeteo.ru
    start_path: news/
    index: { rule: segment_prefix, delimiter: "-" }
    links: ["div.item__title > a::attr(href)"]
    header: "div.article__h > h1::text"
    tags: disabled
    text: *gismeteo_text
"##;

    #[test]
    fn test_parse_sample() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.crawl.concurrency, 2);
        assert_eq!(config.crawl.max_retries, 3);
        assert_eq!(config.format.photo, "[фото]");
        assert_eq!(config.format.video, "[video]");
        assert_eq!(config.storage.date_format, "%d.%m %a %H:%M");
        assert_eq!(config.spiders.len(), 2);

        let ua = &config.spiders[0];
        assert_eq!(ua.links.as_option().map(Vec::len), Some(2));
        assert!(ua.date.as_option().is_none());
        let text = ua.text.as_option().unwrap();
        assert_eq!(text.probe, ProbePolicy::SkipLeadingEmpties { limit: 4 });
        assert_eq!(text.body.exclude.as_deref(), Some("#fb-root"));

        let ru = &config.spiders[1];
        assert_eq!(ru.tags, Toggle::Off(Off::Disabled));
        assert!(ru.text.as_option().is_some());
    }

    #[test]
    fn test_missing_required_field() {
        let yaml = r#"
spiders:
  - name: broken
    scheme: https
    domain: example.org
    start_path: ""
    index: { rule: last_segment }
    links: ["a::attr(href)"]
    header: "h1::text"
    tags: disabled
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_date_format_rejected() {
        let yaml = format!("storage:\n  date_format: \"%d.%m %Q\"\n{}", SAMPLE.trim_start());
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::DateFormat(f) if f == "%d.%m %Q"));

        assert!(validate_date_format("%Y-%m-%d %H:%M").is_ok());
        assert!(validate_date_format("%").is_err());
    }

    #[test]
    fn test_select_spiders() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.select_spiders(&[]).unwrap().len(), 2);

        let picked = config.select_spiders(&["gismeteo_ru".to_string()]).unwrap();
        assert_eq!(picked[0].domain, "www.gismeteo.ru");

        assert!(matches!(
            config.select_spiders(&["nope".to_string()]),
            Err(ConfigError::UnknownSpider(name)) if name == "nope"
        ));
    }

    #[tokio::test]
    async fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/climate_scraper.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

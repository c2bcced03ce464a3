//! Site spiders: news-list indexing and article parsing.
//!
//! A [`Spider`] is compiled from a [`SpiderConfig`] once at startup. A run
//! has two phases, like every news source here:
//!
//! 1. **Indexing**: fetch the news-list page, extract article links, drop
//!    offsite links and links whose index was already scraped
//! 2. **Fetching**: fetch the remaining article pages concurrently and turn
//!    each one into an [`ArticleRecord`]
//!
//! A page is parsed and fully processed before the next await point, so the
//! media tally and classified blocks of an article never outlive its call.

use crate::config::{validate_date_format, SpiderConfig, TextConfig, Toggle};
use crate::error::{ClassificationError, ConfigError, ExtractionError};
use crate::extract::{
    BlockClassifier, ChildPattern, DateExtractor, Extractor, HeaderExtractor, LinkExtractor,
    Pattern, TagsExtractor, TextExtractor, TextFormat, TrashFilter,
};
use crate::fetch::FetchAsync;
use crate::index::{is_duplicate, IndexRule, ScrapedIndexSet};
use crate::models::{ArticleRecord, ArticleRequest};
use crate::utils::truncate_for_log;
use chrono::Local;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use scraper::Html;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// A compiled site definition.
#[derive(Debug, Clone)]
pub struct Spider {
    name: String,
    domain: String,
    start_url: String,
    base: Url,
    index_rule: IndexRule,
    links: Extractor<LinkExtractor>,
    header: Extractor<HeaderExtractor>,
    tags: Extractor<TagsExtractor>,
    date: Extractor<DateExtractor>,
    text: Extractor<TextExtractor>,
    date_format: String,
}

fn toggle<T, E>(
    field: &Toggle<T>,
    build: impl FnOnce(&T) -> Result<E, ConfigError>,
) -> Result<Extractor<E>, ConfigError> {
    Ok(match field.as_option() {
        Some(value) => Extractor::Configured(build(value)?),
        None => Extractor::Disabled,
    })
}

fn text_extractor(config: &TextConfig, format: &TextFormat) -> Result<TextExtractor, ConfigError> {
    let blocks = &config.blocks;
    let classifier = BlockClassifier::new(
        Pattern::parse(&blocks.hyperlink)?,
        Pattern::parse(&blocks.photo)?,
        Pattern::parse(&blocks.video)?,
        Pattern::parse(&blocks.iframe)?,
        TrashFilter::new(&blocks.trash)?,
    );
    Ok(TextExtractor::new(
        ChildPattern::new(
            &config.body.parent,
            &config.body.child,
            config.body.exclude.as_deref(),
        )?,
        config.probe,
        classifier,
        format.clone(),
    ))
}

impl Spider {
    /// Compile a spider. Every pattern, regex, URL part and the fallback date
    /// format is checked here.
    pub fn from_config(
        config: &SpiderConfig,
        format: &TextFormat,
        date_format: &str,
    ) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::Spider {
            spider: config.name.clone(),
            reason,
        };

        if config.scheme != "http" && config.scheme != "https" {
            return Err(invalid(format!("unsupported scheme `{}`", config.scheme)));
        }
        let domain = config.domain.trim().to_ascii_lowercase();
        if domain.is_empty() || domain.contains('/') {
            return Err(invalid(format!("invalid domain `{}`", config.domain)));
        }
        validate_date_format(date_format)?;
        let base = Url::parse(&format!("{}://{}/", config.scheme, domain))
            .map_err(|e| invalid(format!("invalid base URL: {e}")))?;
        let start_url = format!(
            "{}://{}/{}",
            config.scheme,
            domain,
            config.start_path.trim_start_matches('/')
        );

        Ok(Self {
            name: config.name.clone(),
            domain,
            start_url,
            base,
            index_rule: IndexRule::try_from(&config.index)?,
            links: toggle(&config.links, |patterns: &Vec<String>| {
                Ok(LinkExtractor(
                    patterns
                        .iter()
                        .map(|p| Pattern::parse(p))
                        .collect::<Result<_, _>>()?,
                ))
            })?,
            header: toggle(&config.header, |p: &String| {
                Ok(HeaderExtractor(Pattern::parse(p)?))
            })?,
            tags: toggle(&config.tags, |p: &String| Ok(TagsExtractor(Pattern::parse(p)?)))?,
            date: toggle(&config.date, |p: &String| Ok(DateExtractor(Pattern::parse(p)?)))?,
            text: toggle(&config.text, |t: &TextConfig| text_extractor(t, format))?,
            date_format: date_format.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL of the news-list page.
    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    /// Whether `url` belongs to the spider's domain or one of its subdomains.
    pub fn is_allowed(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|host| {
            let host = host.to_ascii_lowercase();
            host == self.domain || host.ends_with(&format!(".{}", self.domain))
        })
    }

    /// Turn a discovered link (absolute URL or path) into a request, unless
    /// it is offsite, has no index, or its index was already scraped.
    pub fn request_for(&self, link: &str, known: &ScrapedIndexSet) -> Option<ArticleRequest> {
        let url = match self.base.join(link) {
            Ok(url) => url,
            Err(e) => {
                warn!(spider = %self.name, %link, error = %e, "Unparseable link");
                return None;
            }
        };
        if !self.is_allowed(&url) {
            debug!(spider = %self.name, %url, "Dropping offsite link");
            return None;
        }
        let Some(index) = self.index_rule.derive_index(url.path()) else {
            warn!(spider = %self.name, path = %url.path(), "No index in link path");
            return None;
        };
        if is_duplicate(&index, known) {
            debug!(spider = %self.name, %index, "Already scraped");
            return None;
        }
        Some(ArticleRequest {
            url: url.to_string(),
            index,
        })
    }

    /// Requests for every new article linked from a news-list page. Links
    /// sharing an index produce one request.
    ///
    /// # Errors
    ///
    /// [`ExtractionError::MalformedNode`] when a link node has no URL.
    pub fn article_requests(
        &self,
        page: &Html,
        known: &ScrapedIndexSet,
    ) -> Result<Vec<ArticleRequest>, ExtractionError> {
        if !self.links.is_enabled() {
            warn!(spider = %self.name, "Link extraction is disabled; nothing to crawl");
        }
        if known.is_empty() {
            debug!(spider = %self.name, "No scraped indexes known; every article is new");
        }
        let links = self.links.extract(page)?;
        if links.is_empty() {
            warn!(spider = %self.name, "News-list page has no article links");
        }
        let requests = links
            .iter()
            .filter_map(|link| self.request_for(link, known))
            .unique_by(|request| request.index.clone())
            .collect::<Vec<_>>();
        info!(
            spider = %self.name,
            links = links.len(),
            requests = requests.len(),
            "Indexed news-list page"
        );
        Ok(requests)
    }

    /// Extract the record of one article page.
    ///
    /// Header, tags and date fall back to empty values on failure; an
    /// unrecognized body block fails the whole article.
    pub fn parse_article(
        &self,
        page: &Html,
        request: &ArticleRequest,
        url: &str,
    ) -> Result<ArticleRecord, ClassificationError> {
        let text = match self.text.extract(page) {
            Ok(text) => text,
            Err(ExtractionError::Classification(e)) => return Err(e),
            Err(e) => {
                warn!(spider = %self.name, %url, error = %e, "Text extraction failed; using empty value");
                String::new()
            }
        };
        let date = match self.date.extract(page) {
            Ok(date) if !date.is_empty() => date,
            _ => Local::now().format(&self.date_format).to_string(),
        };

        Ok(ArticleRecord {
            url: url.to_string(),
            header: self.header.extract_or_default(page),
            tags: self.tags.extract_or_default(page),
            text,
            date,
            index: request.index.clone(),
        })
    }
}

/// Index the news-list page of `spider` and fetch every new article.
///
/// Records are returned in completion order. Articles whose fetch fails or
/// whose body cannot be classified are logged and skipped.
#[instrument(level = "info", skip_all, fields(spider = %spider.name()))]
pub async fn crawl<F: FetchAsync>(
    spider: &Spider,
    fetcher: &F,
    known: &ScrapedIndexSet,
    concurrency: usize,
) -> Result<Vec<ArticleRecord>, Box<dyn Error>> {
    let list = fetcher.fetch(spider.start_url()).await?;
    let requests = {
        let document = Html::parse_document(&list.body);
        spider.article_requests(&document, known)?
    };

    let total = requests.len();
    let records: Vec<ArticleRecord> = stream::iter(requests)
        .map(|request| async move {
            let page = match fetcher.fetch(&request.url).await {
                Ok(page) => page,
                Err(e) => {
                    error!(url = %request.url, error = %e, "Article fetch failed");
                    return None;
                }
            };
            let document = Html::parse_document(&page.body);
            match spider.parse_article(&document, &request, &page.url) {
                Ok(record) => {
                    debug!(url = %record.url, index = %record.index, "Parsed article");
                    Some(record)
                }
                Err(e) => {
                    error!(
                        url = %page.url,
                        error = %truncate_for_log(&e.to_string(), 500),
                        "Article skipped: unclassifiable body block"
                    );
                    None
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(requested = total, scraped = records.len(), "Crawl finished");
    Ok(records)
}

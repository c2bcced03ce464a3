//! Per-field extractors and the failure-isolating [`Extractor`] wrapper.
//!
//! Each field of an article (header, tags, links, date, text) has its own
//! extractor bound to a pattern. [`Extractor::extract`] is the raw entry point
//! and reports why a field could not be read; [`Extractor::extract_or_default`]
//! logs that reason and returns the field's empty value instead, so one
//! broken field never stops the others.

use super::pattern::Pattern;
use super::text::TextExtractor;
use crate::error::ExtractionError;
use crate::utils::truncate_for_log;
use scraper::Html;
use tracing::warn;

/// A typed extractor for one field of a page.
pub trait FieldExtractor {
    type Output: Default;

    /// Field name used in logs and errors.
    const FIELD: &'static str;

    fn extract(&self, page: &Html) -> Result<Self::Output, ExtractionError>;
}

/// A field extractor that may be switched off in the site configuration.
#[derive(Debug, Clone)]
pub enum Extractor<E> {
    Configured(E),
    Disabled,
}

impl<E: FieldExtractor> Extractor<E> {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Configured(_))
    }

    /// Raw extraction. A disabled field yields its empty value.
    pub fn extract(&self, page: &Html) -> Result<E::Output, ExtractionError> {
        match self {
            Self::Configured(extractor) => extractor.extract(page),
            Self::Disabled => Ok(E::Output::default()),
        }
    }

    /// Safe extraction: never fails, logs and falls back to the empty value.
    pub fn extract_or_default(&self, page: &Html) -> E::Output {
        self.extract(page).unwrap_or_else(|e| {
            warn!(field = E::FIELD, error = %e, "Field extraction failed; using empty value");
            E::Output::default()
        })
    }
}

/// First non-empty value of a pattern, trimmed.
fn first_value(
    field: &'static str,
    pattern: &Pattern,
    page: &Html,
) -> Result<String, ExtractionError> {
    pattern
        .values(page.root_element())
        .into_iter()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .ok_or_else(|| ExtractionError::NotFound {
            field,
            pattern: pattern.as_str().to_string(),
        })
}

#[derive(Debug, Clone)]
pub struct HeaderExtractor(pub Pattern);

impl FieldExtractor for HeaderExtractor {
    type Output = String;
    const FIELD: &'static str = "header";

    fn extract(&self, page: &Html) -> Result<String, ExtractionError> {
        first_value(Self::FIELD, &self.0, page)
    }
}

#[derive(Debug, Clone)]
pub struct DateExtractor(pub Pattern);

impl FieldExtractor for DateExtractor {
    type Output = String;
    const FIELD: &'static str = "date";

    fn extract(&self, page: &Html) -> Result<String, ExtractionError> {
        first_value(Self::FIELD, &self.0, page)
    }
}

#[derive(Debug, Clone)]
pub struct TagsExtractor(pub Pattern);

impl FieldExtractor for TagsExtractor {
    type Output = Vec<String>;
    const FIELD: &'static str = "tags";

    fn extract(&self, page: &Html) -> Result<Vec<String>, ExtractionError> {
        let nodes = self.0.select(page.root_element());
        if nodes.is_empty() {
            return Err(ExtractionError::NotFound {
                field: Self::FIELD,
                pattern: self.0.as_str().to_string(),
            });
        }
        Ok(nodes
            .into_iter()
            .filter_map(|node| self.0.value_of(node))
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect())
    }
}

/// Link discovery on a news-list page. Patterns are evaluated in order.
///
/// A page without any matching node yields an empty list. A matching node
/// without the targeted value is logged and skipped; only when every matched
/// node is malformed does extraction fail with
/// [`ExtractionError::MalformedNode`].
#[derive(Debug, Clone)]
pub struct LinkExtractor(pub Vec<Pattern>);

impl FieldExtractor for LinkExtractor {
    type Output = Vec<String>;
    const FIELD: &'static str = "links";

    fn extract(&self, page: &Html) -> Result<Vec<String>, ExtractionError> {
        let mut links = Vec::new();
        let mut first_malformed = None;
        for pattern in &self.0 {
            for node in pattern.select(page.root_element()) {
                match pattern.value_of(node) {
                    Some(link) if !link.trim().is_empty() => links.push(link.trim().to_string()),
                    _ => {
                        let raw = truncate_for_log(&node.html(), 200);
                        warn!(field = Self::FIELD, pattern = pattern.as_str(), %raw, "Skipping malformed link node");
                        first_malformed.get_or_insert(raw);
                    }
                }
            }
        }
        match first_malformed {
            Some(raw) if links.is_empty() => Err(ExtractionError::MalformedNode {
                field: Self::FIELD,
                raw,
            }),
            _ => Ok(links),
        }
    }
}

impl FieldExtractor for TextExtractor {
    type Output = String;
    const FIELD: &'static str = "text";

    fn extract(&self, page: &Html) -> Result<String, ExtractionError> {
        self.extract_text(page)
    }
}

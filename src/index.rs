//! Article indexes and duplicate filtering.
//!
//! An [`Index`] is derived from an article URL path by a per-site
//! [`IndexRule`]. The set of indexes scraped by earlier runs is loaded once
//! per run into a [`ScrapedIndexSet`] and only read afterwards.

use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Identifier of an article for deduplication purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Index(String);

impl Index {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a site's URL paths map to indexes, as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum IndexRuleConfig {
    /// Second-to-last `/` segment, cut at the first `delimiter`.
    SegmentPrefix { delimiter: String },
    /// Last non-empty path segment.
    LastSegment,
    /// First capture group of `regex`.
    Pattern { regex: String },
}

/// A compiled index rule.
#[derive(Debug, Clone)]
pub enum IndexRule {
    SegmentPrefix { delimiter: String },
    LastSegment,
    Pattern(Regex),
}

impl TryFrom<&IndexRuleConfig> for IndexRule {
    type Error = ConfigError;

    fn try_from(config: &IndexRuleConfig) -> Result<Self, Self::Error> {
        Ok(match config {
            IndexRuleConfig::SegmentPrefix { delimiter } => Self::SegmentPrefix {
                delimiter: delimiter.clone(),
            },
            IndexRuleConfig::LastSegment => Self::LastSegment,
            IndexRuleConfig::Pattern { regex } => {
                Self::Pattern(Regex::new(regex).map_err(|source| ConfigError::Regex {
                    pattern: regex.clone(),
                    source,
                })?)
            }
        })
    }
}

impl IndexRule {
    /// Derive the index of a URL path; `None` when the path does not have
    /// the shape the rule expects.
    pub fn derive_index(&self, path: &str) -> Option<Index> {
        let decoded = urlencoding::decode(path)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| path.to_string());

        let value = match self {
            Self::SegmentPrefix { delimiter } => {
                let segment = decoded.rsplit('/').nth(1)?;
                if delimiter.is_empty() {
                    segment.to_string()
                } else {
                    segment.split(delimiter.as_str()).next()?.to_string()
                }
            }
            Self::LastSegment => decoded
                .split('/')
                .filter(|s| !s.is_empty())
                .next_back()?
                .to_string(),
            Self::Pattern(re) => re.captures(&decoded)?.get(1)?.as_str().to_string(),
        };

        (!value.is_empty()).then(|| Index(value))
    }
}

/// Indexes scraped before the current run started. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct ScrapedIndexSet {
    indexes: HashSet<Index>,
}

impl ScrapedIndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    pub fn contains(&self, index: &Index) -> bool {
        self.indexes.contains(index)
    }
}

impl FromIterator<Index> for ScrapedIndexSet {
    fn from_iter<I: IntoIterator<Item = Index>>(iter: I) -> Self {
        Self {
            indexes: iter.into_iter().collect(),
        }
    }
}

/// Whether `index` was already scraped by an earlier run.
pub fn is_duplicate(index: &Index, known: &ScrapedIndexSet) -> bool {
    known.contains(index)
}

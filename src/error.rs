//! Error types for configuration, block classification and field extraction.
//!
//! The three enums map onto the three failure scopes of a crawl run:
//! - [`ConfigError`]: fatal at startup, before any page is processed
//! - [`ClassificationError`]: fatal for a single article
//! - [`ExtractionError`]: fatal for a single field, usually turned into a
//!   fallback value by [`Extractor::extract_or_default`](crate::extract::Extractor::extract_or_default)

use std::path::PathBuf;

/// Errors raised while loading the YAML configuration or compiling spiders.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The YAML document is malformed or a required field is missing.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A CSS selector in a pattern did not compile.
    #[error("invalid selector `{pattern}`: {reason}")]
    Selector { pattern: String, reason: String },

    /// A trash or index regex did not compile.
    #[error("invalid regex `{pattern}`: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A chrono `strftime` format string contains an invalid specifier.
    #[error("invalid date format `{0}`")]
    DateFormat(String),

    /// A spider definition is inconsistent (bad scheme, empty domain, ...).
    #[error("spider `{spider}`: {reason}")]
    Spider { spider: String, reason: String },

    /// A spider requested on the command line is not defined in the config.
    #[error("no spider named `{0}` in config")]
    UnknownSpider(String),
}

/// A block of an article body matched none of the classification rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationError {
    #[error("uncategorised block: {raw}")]
    UnrecognizedBlock { raw: String },
}

/// Errors returned by the raw (non-safe) field extraction entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// The field's pattern matched nothing on the page.
    #[error("`{field}`: nothing matches `{pattern}`")]
    NotFound { field: &'static str, pattern: String },

    /// The pattern matched a node that lacks the targeted text or attribute.
    #[error("`{field}`: malformed node {raw}")]
    MalformedNode { field: &'static str, raw: String },

    /// The article body contains a block outside the classification grammar.
    #[error(transparent)]
    Classification(#[from] ClassificationError),
}

//! Block classification for article bodies.
//!
//! Every direct child of an article body is assigned exactly one
//! [`BlockCategory`]. Rules are checked in a fixed order and the first match
//! wins: hyperlink, photo caption, video container, iframe, trash, plain text.
//! A block matching none of them is [`BlockCategory::Unrecognized`]; the text
//! reconstructor turns that into a [`ClassificationError`](crate::error::ClassificationError)
//! instead of dropping the block.

use super::media::MediaTally;
use super::pattern::{direct_text, Pattern, Target};
use crate::error::ConfigError;
use crate::utils::truncate_for_log;
use regex::Regex;
use scraper::ElementRef;
use tracing::{debug, warn};

/// The category of one article body block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockCategory {
    /// A block with a hyperlink child. `runs` holds the block's text in
    /// order, one run per direct child; the anchor's text is always a single
    /// run equal to `text`, so the link can be inlined where it appears.
    Hyperlink {
        text: String,
        href: String,
        runs: Vec<String>,
    },
    Photo,
    Video,
    Iframe,
    Trash,
    PlainText { content: String },
    /// Matched no rule; carries the block's raw markup.
    Unrecognized { raw: String },
}

/// Boilerplate detector applied to a block's direct text.
#[derive(Debug, Clone, Default)]
pub struct TrashFilter {
    patterns: Vec<Regex>,
}

impl TrashFilter {
    /// # Errors
    ///
    /// [`ConfigError::Regex`] for the first pattern that does not compile.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|source| ConfigError::Regex {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_trash(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }
}

/// The classification grammar of one site.
#[derive(Debug, Clone)]
pub struct BlockClassifier {
    hyperlink: Pattern,
    photo: Pattern,
    video: Pattern,
    iframe: Pattern,
    trash: TrashFilter,
}

impl BlockClassifier {
    pub fn new(
        hyperlink: Pattern,
        photo: Pattern,
        video: Pattern,
        iframe: Pattern,
        trash: TrashFilter,
    ) -> Self {
        Self {
            hyperlink,
            photo,
            video,
            iframe,
            trash,
        }
    }

    /// Classify a single block.
    pub fn classify(&self, node: ElementRef<'_>) -> BlockCategory {
        if let Some(anchor) = self
            .hyperlink
            .matching_children(node)
            .into_iter()
            .find(|anchor| !direct_text(*anchor).is_empty())
        {
            return BlockCategory::Hyperlink {
                text: anchor.text().collect(),
                href: anchor.value().attr("href").unwrap_or_default().to_string(),
                runs: text_runs(node),
            };
        }
        if has_child(&self.photo, node) {
            return BlockCategory::Photo;
        }
        if has_child(&self.video, node) {
            return BlockCategory::Video;
        }
        if has_child(&self.iframe, node) {
            return BlockCategory::Iframe;
        }

        let text = direct_text(node);
        if !text.is_empty() && self.trash.is_trash(&text) {
            return BlockCategory::Trash;
        }
        if !text.is_empty() {
            return BlockCategory::PlainText {
                content: node.text().collect(),
            };
        }
        BlockCategory::Unrecognized { raw: node.html() }
    }

    /// Classify every block of one body in order, counting media as it goes.
    pub fn classify_body(&self, blocks: &[ElementRef<'_>]) -> (Vec<BlockCategory>, MediaTally) {
        let mut tally = MediaTally::new();
        let categories = blocks
            .iter()
            .map(|block| {
                let category = self.classify(*block);
                match &category {
                    BlockCategory::Photo => tally.add_photo(),
                    BlockCategory::Video => tally.add_video(),
                    BlockCategory::Iframe => tally.add_iframe(),
                    BlockCategory::Unrecognized { raw } => {
                        warn!(raw = %truncate_for_log(raw, 200), "Block matches no classification rule");
                    }
                    _ => {}
                }
                category
            })
            .collect::<Vec<_>>();
        debug!(
            blocks = categories.len(),
            photos = tally.photos(),
            videos = tally.videos(),
            iframes = tally.iframes(),
            "Classified article body"
        );
        (categories, tally)
    }
}

/// The text of `node`, one run per direct child. An element child's text
/// nodes form one run even when comments split them.
fn text_runs(node: ElementRef<'_>) -> Vec<String> {
    node.children()
        .filter_map(|child| match ElementRef::wrap(child) {
            Some(element) => Some(element.text().collect::<String>()),
            None => child.value().as_text().map(|text| text.to_string()),
        })
        .filter(|run| !run.is_empty())
        .collect()
}

/// A direct child matches `pattern`; patterns with a `::text` or `::attr`
/// target also require that value to be present.
fn has_child(pattern: &Pattern, node: ElementRef<'_>) -> bool {
    let children = pattern.matching_children(node);
    match pattern.target() {
        Target::Element => !children.is_empty(),
        _ => children.into_iter().any(|child| pattern.value_of(child).is_some()),
    }
}

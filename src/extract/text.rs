//! Article text reconstruction from classified blocks.

use super::children::{ChildPattern, ProbePolicy};
use super::classify::{BlockCategory, BlockClassifier};
use super::media::MediaTally;
use crate::error::{ClassificationError, ExtractionError};
use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Output templates used while reconstructing text.
///
/// `hyperlink` understands `{text}` and `{link}`, `media_summary` understands
/// `{media}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TextFormat {
    pub hyperlink: String,
    pub photo: String,
    pub video: String,
    pub media_summary: String,
}

impl Default for TextFormat {
    fn default() -> Self {
        Self {
            hyperlink: "[{text}]({link})".to_string(),
            photo: "[photo]".to_string(),
            video: "[video]".to_string(),
            media_summary: "\n[{media}]".to_string(),
        }
    }
}

impl TextFormat {
    pub fn render_hyperlink(&self, text: &str, href: &str) -> String {
        self.hyperlink.replace("{text}", text).replace("{link}", href)
    }

    /// The trailing media clause, or an empty string when nothing was omitted.
    pub fn render_media(&self, tally: &MediaTally) -> String {
        if tally.is_empty() {
            String::new()
        } else {
            self.media_summary.replace("{media}", &tally.summarize())
        }
    }
}

/// Join classified blocks into one string, in document order.
///
/// # Errors
///
/// [`ClassificationError::UnrecognizedBlock`] for the first unrecognized
/// block; no partial text is returned in that case.
pub fn reconstruct(
    blocks: &[BlockCategory],
    tally: &MediaTally,
    format: &TextFormat,
) -> Result<String, ClassificationError> {
    let mut out = String::new();
    for block in blocks {
        match block {
            BlockCategory::Hyperlink { text, href, runs } => {
                if !runs.contains(text) {
                    debug!(%text, %href, "Hyperlink text not found in block runs; left as plain text");
                }
                for run in runs {
                    if run == text {
                        out.push_str(&format.render_hyperlink(text, href));
                    } else {
                        out.push_str(run);
                    }
                }
            }
            BlockCategory::Photo => out.push_str(&format.photo),
            BlockCategory::Video => out.push_str(&format.video),
            BlockCategory::Iframe | BlockCategory::Trash => {}
            BlockCategory::PlainText { content } => out.push_str(content),
            BlockCategory::Unrecognized { raw } => {
                return Err(ClassificationError::UnrecognizedBlock { raw: raw.clone() });
            }
        }
    }
    out.push_str(&format.render_media(tally));
    Ok(out)
}

/// Extracts an article's body text: enumerates the body blocks, classifies
/// them and reconstructs the text.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    body: ChildPattern,
    policy: ProbePolicy,
    classifier: BlockClassifier,
    format: TextFormat,
}

impl TextExtractor {
    pub fn new(
        body: ChildPattern,
        policy: ProbePolicy,
        classifier: BlockClassifier,
        format: TextFormat,
    ) -> Self {
        Self {
            body,
            policy,
            classifier,
            format,
        }
    }

    /// A body with no blocks yields an empty string.
    #[instrument(level = "debug", skip_all)]
    pub fn extract_text(&self, page: &Html) -> Result<String, ExtractionError> {
        let blocks = self.body.children(page.root_element(), self.policy);
        let (categories, tally) = self.classifier.classify_body(&blocks);
        let text = reconstruct(&categories, &tally, &self.format)?;
        debug!(blocks = blocks.len(), chars = text.chars().count(), "Reconstructed article text");
        Ok(text)
    }
}

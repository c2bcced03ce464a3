//! Content extraction from parsed pages.
//!
//! # Submodules
//!
//! - [`pattern`]: `css::text` / `css::attr(name)` field patterns
//! - [`children`]: ordered child enumeration from positional probes
//! - [`classify`]: article body block classification
//! - [`media`]: omitted-media tally
//! - [`text`]: article text reconstruction
//! - [`fields`]: per-field extractors with safe fallbacks
//!
//! # Text pipeline
//!
//! ```text
//! body blocks (children) -> BlockCategory per block (classify) + MediaTally
//!                        -> one string (text::reconstruct)
//! ```

pub mod children;
pub mod classify;
pub mod fields;
pub mod media;
pub mod pattern;
pub mod text;

pub use children::ChildPattern;
pub use classify::{BlockClassifier, TrashFilter};
pub use fields::{DateExtractor, Extractor, HeaderExtractor, LinkExtractor, TagsExtractor};
pub use pattern::Pattern;
pub use text::{TextExtractor, TextFormat};

//! Positional child enumeration.
//!
//! The only query available for the children of an article body is "the
//! element at position `i`" (`parent > child:nth-child(i)`, optionally with
//! `:not(exclude)`), asked of one parent element. This module rebuilds the
//! ordered child sequence from those single-position probes.
//!
//! # Termination
//!
//! `nth-child` numbering is 1-based and counts every element sibling,
//! including the ones removed by the exclusion pattern. A body whose first
//! element is excluded (a social widget root, say) therefore starts with an
//! empty position. [`ProbePolicy`] decides what such a gap means:
//!
//! | Policy | Leading empty position | Empty position after a match |
//! |--------|------------------------|------------------------------|
//! | `StopOnFirstEmpty` | stop | stop |
//! | `SkipLeadingEmpties { limit }` | skip, at most `limit` in a row | stop |

use super::pattern::{child_elements, compile_selector};
use crate::error::ConfigError;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// How the enumerator treats empty positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ProbePolicy {
    /// The first empty position ends the sequence.
    StopOnFirstEmpty,
    /// Empty positions before the first match are skipped, up to `limit`
    /// consecutive ones; after a match the first empty position ends the
    /// sequence.
    SkipLeadingEmpties { limit: usize },
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self::SkipLeadingEmpties { limit: 8 }
    }
}

/// Probe positions `1, 2, 3, ...` with `probe` and collect the matches in
/// order until `policy` says to stop.
///
/// Never fails; an empty vector means no child matched.
pub fn enumerate_positions<N, F>(policy: ProbePolicy, mut probe: F) -> Vec<N>
where
    F: FnMut(usize) -> Option<N>,
{
    let mut found = Vec::new();
    let mut leading_gaps = 0usize;
    let mut position = 1usize;

    loop {
        match probe(position) {
            Some(node) => found.push(node),
            None if !found.is_empty() => break,
            None => match policy {
                ProbePolicy::StopOnFirstEmpty => break,
                ProbePolicy::SkipLeadingEmpties { limit } => {
                    leading_gaps += 1;
                    if leading_gaps > limit {
                        break;
                    }
                }
            },
        }
        position += 1;
    }

    trace!(probes = position, found = found.len(), "Enumerated positional children");
    found
}

/// The structural pattern of an article body's children.
#[derive(Debug, Clone)]
pub struct ChildPattern {
    parent: Selector,
    child: Selector,
    exclude: Option<Selector>,
}

impl ChildPattern {
    /// Compile the parent, child and exclusion selectors.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Selector`] when any part is not valid CSS.
    pub fn new(parent: &str, child: &str, exclude: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            parent: compile_selector(parent.trim())?,
            child: compile_selector(child.trim())?,
            exclude: exclude
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(compile_selector)
                .transpose()?,
        })
    }

    /// The element at 1-based `position` among the element children of
    /// `parent`, if it matches the child pattern and is not excluded.
    /// Same semantics as `parent > child:nth-child(position):not(exclude)`.
    pub fn child_at<'a>(&self, parent: ElementRef<'a>, position: usize) -> Option<ElementRef<'a>> {
        let element = child_elements(parent).nth(position.checked_sub(1)?)?;
        let excluded = self.exclude.as_ref().is_some_and(|e| e.matches(&element));
        (self.child.matches(&element) && !excluded).then_some(element)
    }

    /// The ordered children of the first element below `scope` matching the
    /// parent pattern. Only that one parent is probed.
    pub fn children<'a>(&self, scope: ElementRef<'a>, policy: ProbePolicy) -> Vec<ElementRef<'a>> {
        let Some(parent) = scope.select(&self.parent).next() else {
            trace!("No element matches the body parent pattern");
            return Vec::new();
        };
        enumerate_positions(policy, |position| self.child_at(parent, position))
    }
}

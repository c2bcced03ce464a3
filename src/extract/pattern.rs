//! Field patterns: CSS selectors with an optional `::text` / `::attr(name)` suffix.
//!
//! A pattern such as `div.item__title > a::attr(href)` is split into the CSS
//! part, compiled once with [`scraper::Selector`], and a [`Target`] telling
//! which value a matched element yields.

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

static TARGET_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"::(?:text|attr\(\s*([^)\s]+)\s*\))\s*$").unwrap());

/// What a matched element yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The element itself; its value is the full descendant text.
    Element,
    /// The element's direct text nodes.
    Text,
    /// The named attribute.
    Attr(String),
}

/// A compiled field pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    selector: Selector,
    target: Target,
}

impl Pattern {
    /// Compile a pattern string.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Selector`] when the CSS part does not parse.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let (css, target) = match TARGET_SUFFIX_RE.captures(raw) {
            Some(caps) => {
                let start = caps.get(0).map_or(raw.len(), |m| m.start());
                let target = match caps.get(1) {
                    Some(name) => Target::Attr(name.as_str().to_string()),
                    None => Target::Text,
                };
                (&raw[..start], target)
            }
            None => (raw, Target::Element),
        };

        Ok(Self {
            raw: raw.to_string(),
            selector: compile_selector(css.trim())?,
            target,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Elements below `scope` matching the CSS part, in document order.
    pub fn select<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        scope.select(&self.selector).collect()
    }

    /// Direct children of `parent` matching the CSS part.
    pub fn matching_children<'a>(&self, parent: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        child_elements(parent)
            .filter(|child| self.selector.matches(child))
            .collect()
    }

    /// The targeted value of one element; `None` when the text is empty or
    /// the attribute is missing.
    pub fn value_of(&self, element: ElementRef<'_>) -> Option<String> {
        match &self.target {
            Target::Element => {
                let text = element.text().collect::<String>();
                (!text.is_empty()).then_some(text)
            }
            Target::Text => {
                let text = direct_text(element);
                (!text.is_empty()).then_some(text)
            }
            Target::Attr(name) => element.value().attr(name).map(str::to_string),
        }
    }

    /// Every non-empty targeted value below `scope`.
    pub fn values(&self, scope: ElementRef<'_>) -> Vec<String> {
        self.select(scope)
            .into_iter()
            .filter_map(|element| self.value_of(element))
            .collect()
    }
}

/// Compile a bare CSS selector, mapping failures to [`ConfigError::Selector`].
pub fn compile_selector(css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::Selector {
        pattern: css.to_string(),
        reason: e.to_string(),
    })
}

/// Element children of `parent`, skipping text and comment nodes.
pub fn child_elements<'a>(parent: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    parent.children().filter_map(ElementRef::wrap)
}

/// Concatenation of the text nodes directly under `element`.
pub fn direct_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| &**text)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_parse_text_suffix() {
        let pattern = Pattern::parse("div.article__h > h1::text").unwrap();
        assert_eq!(pattern.target(), &Target::Text);
        assert_eq!(pattern.as_str(), "div.article__h > h1::text");
    }

    #[test]
    fn test_parse_attr_suffix() {
        let pattern = Pattern::parse("div.item__title > a::attr(href)").unwrap();
        assert_eq!(pattern.target(), &Target::Attr("href".to_string()));
    }

    #[test]
    fn test_parse_bare_selector() {
        let pattern = Pattern::parse("div.pic").unwrap();
        assert_eq!(pattern.target(), &Target::Element);
    }

    #[test]
    fn test_parse_invalid_selector() {
        let err = Pattern::parse("div >> ::text").unwrap_err();
        assert!(matches!(err, ConfigError::Selector { .. }));
    }

    #[test]
    fn test_values_text_and_attr() {
        let html = Html::parse_document(
            r#"<div class="tags"><a href="/t/1">heat</a><a href="/t/2">rain</a><a href="/t/3"></a></div>"#,
        );
        let root = html.root_element();

        let texts = Pattern::parse("div.tags > a::text").unwrap().values(root);
        assert_eq!(texts, vec!["heat", "rain"]);

        let hrefs = Pattern::parse("div.tags > a::attr(href)").unwrap().values(root);
        assert_eq!(hrefs, vec!["/t/1", "/t/2", "/t/3"]);
    }

    #[test]
    fn test_direct_text_ignores_nested_elements() {
        let html = Html::parse_fragment(r#"<div>Hello <b>bold</b> world</div>"#);
        let div = Pattern::parse("div").unwrap().select(html.root_element())[0];
        assert_eq!(direct_text(div), "Hello  world");
    }

    #[test]
    fn test_matching_children_only_direct() {
        let html = Html::parse_fragment(r#"<div><a>direct</a><p><a>nested</a></p></div>"#);
        let div = Pattern::parse("div").unwrap().select(html.root_element())[0];
        let anchors = Pattern::parse("a").unwrap().matching_children(div);
        assert_eq!(anchors.len(), 1);
        assert_eq!(direct_text(anchors[0]), "direct");
    }
}

use super::scorer::is_unstable;
use crate::config::schema::{ScoringConfig, VerificationConfig};
use lodestar_common::protocol::{ElementDescriptor, LocatorStrategy, xpath_literal, xpath_tag};

/// Ordered strategy attempts for one candidate: structural identity first,
/// then accessible name, image attributes, and finally visible text.
pub fn strategies(
    element: &ElementDescriptor,
    scoring: &ScoringConfig,
    verification: &VerificationConfig,
) -> Vec<LocatorStrategy> {
    let mut out = Vec::new();
    let tag = element.tag.as_str();

    if let Some(id) = &element.id
        && !is_unstable(id, scoring)
    {
        out.push(LocatorStrategy::ById(id.clone()));
    }

    if let Some(name) = &element.name
        && !is_unstable(name, scoring)
    {
        out.push(LocatorStrategy::ByName(name.clone()));
    }

    if let Some(label) = &element.aria_label {
        out.push(LocatorStrategy::ByAria {
            tag: tag.to_string(),
            label: label.clone(),
        });
    }

    if element.is_image_like() {
        if let Some(alt) = &element.alt {
            out.push(LocatorStrategy::ByAttributeXPath(format!(
                "//{}[@alt={}]",
                xpath_tag(tag),
                xpath_literal(alt)
            )));
        }
        if let Some(fragment) = element
            .src
            .as_deref()
            .and_then(|src| src_fragment(src, verification.min_src_fragment_len))
            .filter(|f| !is_unstable(f, scoring))
        {
            out.push(LocatorStrategy::ByAttributeXPath(format!(
                "//{}[contains(@src,{})]",
                xpath_tag(tag),
                xpath_literal(&fragment)
            )));
        }
    } else if let Some(text) = element.text.as_deref().map(normalize_text)
        && !text.is_empty()
    {
        if tag == "input" {
            // Button-like inputs carry their caption in `value`, not in text nodes.
            out.push(LocatorStrategy::ByAttributeXPath(format!(
                "//input[@value={}]",
                xpath_literal(&text)
            )));
        } else {
            let prefix: String = text.chars().take(verification.text_prefix_len).collect();
            out.push(LocatorStrategy::ByTextExact {
                tag: tag.to_string(),
                text: text.clone(),
            });
            out.push(LocatorStrategy::ByTextContains {
                tag: tag.to_string(),
                text: prefix.trim_end().to_string(),
            });
        }
    }

    out
}

/// Collapse runs of whitespace and trim.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Last path segment of an image source, without query string or fragment.
pub fn src_fragment(src: &str, min_len: usize) -> Option<String> {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    let file = path.trim_end_matches('/').rsplit('/').next()?;
    (file.chars().count() >= min_len).then(|| file.to_string())
}

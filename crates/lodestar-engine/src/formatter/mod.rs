use crate::resolution::{Ranking, ResolveError};
use lodestar_common::protocol::ResolvedLocator;

pub fn format_resolution(intent: &str, result: &Result<ResolvedLocator, ResolveError>) -> String {
    match result {
        Ok(locator) => format!(
            "{} -> {} [{}] score={:.1} category={}",
            intent,
            locator.strategy,
            locator.selector(),
            locator.score,
            locator.category
        ),
        Err(ResolveError::NotFound {
            candidates,
            attempted,
            ..
        }) => {
            let mut output = format!(
                "{} -> not found ({} candidates above floor)",
                intent, candidates
            );
            if !attempted.is_empty() {
                output.push_str("\n  Attempted:");
                for strategy in attempted {
                    output.push_str(&format!("\n  - {}", strategy));
                }
            }
            output
        }
        Err(e) => format!("{} -> Error: {}", intent, e),
    }
}

pub fn format_ranking(ranking: &Ranking) -> String {
    let mut output = format!(
        "Intent: {}\nCategory: {}\nCandidates: {}",
        ranking.intent,
        ranking.category,
        ranking.candidates.len()
    );
    for (rank, candidate) in ranking.candidates.iter().enumerate() {
        let element = &candidate.element;
        let label = element
            .id
            .as_deref()
            .map(|id| format!("#{}", id))
            .or_else(|| element.name.as_deref().map(|n| format!("[name={}]", n)))
            .or_else(|| element.aria_label.as_deref().map(|a| format!("[aria-label={}]", a)))
            .or_else(|| element.text.as_deref().map(|t| format!("\"{}\"", truncate(t, 30))))
            .unwrap_or_default();
        let b = &candidate.breakdown;
        output.push_str(&format!(
            "\n{:>3}. <{}>{} score={:.1} attr={:.1} sim={:.3} prox={:.1}{}",
            rank + 1,
            element.tag,
            label,
            candidate.score,
            b.attribute,
            b.adjusted_similarity,
            b.proximity,
            if b.visual_fallback { " (visual)" } else { "" }
        ));
    }
    output
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    format!("{}...", head)
}

/// Hide typed values whose intent names a secret. Keys match whole words.
pub fn mask_sensitive(intent: &str, value: &str) -> String {
    let sensitive_keys = [
        "password",
        "secret",
        "token",
        "key",
        "cvv",
        "ssn",
        "card number",
        "credit card",
    ];
    let words: Vec<String> = intent
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    let sensitive = sensitive_keys.iter().any(|key| {
        let key: Vec<&str> = key.split(' ').collect();
        words
            .windows(key.len())
            .any(|w| w.iter().map(String::as_str).eq(key.iter().copied()))
    });
    if sensitive {
        "********".to_string()
    } else {
        value.to_string()
    }
}

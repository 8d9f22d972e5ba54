use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;

static AI_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\[ai\]").unwrap());
static PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"](.*?)['"]|<(.*?)>"#).unwrap());
static KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(given|when|then|and|but)\s+").unwrap());
static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]*)""#).unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepError {
    #[error("Step is empty")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Quoted value: literal test data.
    Literal,
    /// Angle-bracketed name: filled in by a scenario outline.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepParameter {
    pub value: String,
    pub kind: ParameterKind,
    /// Identifier-safe argument name.
    pub argument: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepIntent {
    pub intent: String,
    pub parameter: Option<StepParameter>,
}

/// A step broken down into the intents that need locating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepPlan {
    /// Step text with the `[ai]` tag removed.
    pub text: String,
    pub ai_tagged: bool,
    pub intents: Vec<StepIntent>,
}

impl StepPlan {
    /// Page-object method name: the first three words of the step (without
    /// parameters) followed by the argument names.
    pub fn method_name(&self) -> String {
        let stripped = PARAM_RE.replace_all(&self.text, "").to_lowercase();
        let mut parts: Vec<String> = stripped
            .split_whitespace()
            .take(3)
            .map(identifier)
            .filter(|w| !w.is_empty())
            .collect();
        parts.extend(
            self.intents
                .iter()
                .filter_map(|i| i.parameter.as_ref().map(|p| p.argument.clone())),
        );
        parts.join("_").trim_matches('_').to_string()
    }
}

fn identifier(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

fn strip_keyword(context: &str) -> String {
    KEYWORD_RE.replace(context, "").trim().to_string()
}

/// Split a BDD step into one intent per parameter, or a single intent when
/// the step has no parameters.
pub fn decompose_step(step: &str) -> Result<StepPlan, StepError> {
    let ai_tagged = AI_TAG_RE.is_match(step);
    let text = AI_TAG_RE
        .replace_all(step, "")
        .replace("  ", " ")
        .trim()
        .to_string();
    if text.is_empty() {
        return Err(StepError::Empty);
    }

    let parameters: Vec<StepParameter> = PARAM_RE
        .captures_iter(&text)
        .map(|caps| {
            let (value, kind) = match (caps.get(1), caps.get(2)) {
                (Some(m), _) => (m.as_str(), ParameterKind::Literal),
                (None, Some(m)) => (m.as_str(), ParameterKind::Placeholder),
                (None, None) => ("", ParameterKind::Literal),
            };
            StepParameter {
                value: value.to_string(),
                kind,
                argument: value.replace(['-', ' '], "_"),
            }
        })
        .collect();

    let lowered = text.to_lowercase();
    if parameters.is_empty() {
        return Ok(StepPlan {
            intents: vec![StepIntent {
                intent: strip_keyword(lowered.trim()),
                parameter: None,
            }],
            text,
            ai_tagged,
        });
    }

    let contexts: Vec<&str> = PARAM_RE.split(&lowered).collect();
    let intents = parameters
        .into_iter()
        .enumerate()
        .map(|(i, parameter)| {
            let mut context = contexts.get(i).map(|c| c.trim()).unwrap_or("").to_string();
            if context.chars().count() < 3 && i > 0 {
                let previous = contexts.get(i - 1).copied().unwrap_or("");
                context = format!("{} {}", previous, context)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ");
            }
            StepIntent {
                intent: strip_keyword(&context),
                parameter: Some(parameter),
            }
        })
        .collect();

    Ok(StepPlan {
        text,
        ai_tagged,
        intents,
    })
}

/// First double-quoted value in a step: the data a step types.
pub fn action_data(step: &str) -> Option<String> {
    QUOTED_RE
        .captures(step)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_parameter_step() {
        let plan = decompose_step(
            r#"When [ai] user enters username "Admin" and password <user-password>"#,
        )
        .unwrap();
        assert!(plan.ai_tagged);
        assert_eq!(
            plan.text,
            r#"When user enters username "Admin" and password <user-password>"#
        );
        assert_eq!(plan.intents.len(), 2);

        assert_eq!(plan.intents[0].intent, "user enters username");
        let first = plan.intents[0].parameter.as_ref().unwrap();
        assert_eq!(first.value, "Admin");
        assert_eq!(first.kind, ParameterKind::Literal);

        assert_eq!(plan.intents[1].intent, "password");
        let second = plan.intents[1].parameter.as_ref().unwrap();
        assert_eq!(second.kind, ParameterKind::Placeholder);
        assert_eq!(second.argument, "user_password");
    }

    #[test]
    fn test_short_context_borrows_previous() {
        let plan = decompose_step(r#"Given search for "shoes" in "Men""#).unwrap();
        assert_eq!(plan.intents[0].intent, "search for");
        assert_eq!(plan.intents[1].intent, "search for in");
    }

    #[test]
    fn test_step_without_parameters() {
        let plan = decompose_step("Then [AI] click the login button").unwrap();
        assert!(plan.ai_tagged);
        assert_eq!(plan.intents.len(), 1);
        assert_eq!(plan.intents[0].intent, "click the login button");
        assert!(plan.intents[0].parameter.is_none());
    }

    #[test]
    fn test_untagged_and_empty_steps() {
        assert!(!decompose_step("When user logs in").unwrap().ai_tagged);
        assert_eq!(decompose_step("  [ai] "), Err(StepError::Empty));
    }

    #[test]
    fn test_method_name() {
        let plan =
            decompose_step(r#"When [ai] user enters username "Admin" and password <user-password>"#)
                .unwrap();
        assert_eq!(plan.method_name(), "when_user_enters_Admin_user_password");
    }

    #[test]
    fn test_action_data() {
        assert_eq!(
            action_data(r#"When user types "hello world" into "search""#).as_deref(),
            Some("hello world")
        );
        assert_eq!(action_data("When user clicks login"), None);
    }
}

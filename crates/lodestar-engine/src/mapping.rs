use lodestar_common::protocol::{IntentCategory, LocatorStrategy, ResolvedLocator, Selector};
use serde::{Deserialize, Serialize};

/// What generated page-object code does with a located element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Type,
    Click,
    Verify,
}

impl ActionKind {
    /// Any mapping that carries an argument types it; otherwise the
    /// category decides.
    pub fn infer(category: IntentCategory, has_argument: bool) -> Self {
        if has_argument {
            return ActionKind::Type;
        }
        match category {
            IntentCategory::Input => ActionKind::Type,
            IntentCategory::Action => ActionKind::Click,
            IntentCategory::Visual => ActionKind::Verify,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementMapping {
    pub intent: String,
    pub strategy: LocatorStrategy,
    pub selector: Selector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
    pub action: ActionKind,
}

impl ElementMapping {
    pub fn new(intent: &str, locator: &ResolvedLocator, argument: Option<String>) -> Self {
        Self {
            intent: intent.to_string(),
            strategy: locator.strategy.clone(),
            selector: locator.selector(),
            action: ActionKind::infer(locator.category, argument.is_some()),
            argument,
        }
    }
}

/// Request body for the page-object generation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageObjectPayload {
    pub instruction: String,
    pub scenario: String,
    pub mappings: Vec<ElementMapping>,
}

impl PageObjectPayload {
    pub fn new(instruction: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            scenario: scenario.into(),
            mappings: Vec::new(),
        }
    }

    pub fn push(&mut self, mapping: ElementMapping) {
        self.mappings.push(mapping);
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Custom deserializer for optional strings that treats `null`, `""` and
/// whitespace-only values as absent. The extraction script reports every
/// attribute slot, filled or not.
fn deserialize_blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

/// A point in viewport (CSS pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// The attributes of a descriptor that take part in weighted fuzzy scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Id,
    Name,
    AriaLabel,
    Alt,
    Placeholder,
    LabelText,
    Text,
    Src,
    Role,
    ClassName,
}

impl Attribute {
    pub const ALL: [Attribute; 10] = [
        Attribute::Id,
        Attribute::Name,
        Attribute::AriaLabel,
        Attribute::Alt,
        Attribute::Placeholder,
        Attribute::LabelText,
        Attribute::Text,
        Attribute::Src,
        Attribute::Role,
        Attribute::ClassName,
    ];

    /// Attributes whose values are often machine-generated.
    pub fn may_be_generated(&self) -> bool {
        matches!(self, Attribute::Id | Attribute::Name | Attribute::Src)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Id => "id",
            Attribute::Name => "name",
            Attribute::AriaLabel => "aria-label",
            Attribute::Alt => "alt",
            Attribute::Placeholder => "placeholder",
            Attribute::LabelText => "label",
            Attribute::Text => "text",
            Attribute::Src => "src",
            Attribute::Role => "role",
            Attribute::ClassName => "class",
        }
    }
}

/// Snapshot of one visible, interactive page element.
///
/// Produced fresh by every extraction pass and owned by the resolution call
/// that requested it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    pub tag: String,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub placeholder: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub aria_label: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub alt: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub src: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub input_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub label_text: Option<String>,
    #[serde(default)]
    pub rect: Rect,
    /// Number of shadow roots between the document and this element.
    #[serde(default)]
    pub shadow_depth: u32,
}

impl ElementDescriptor {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_lowercase(),
            ..Default::default()
        }
    }

    /// Value of a scored attribute, if present on this element.
    pub fn attribute(&self, attr: Attribute) -> Option<&str> {
        match attr {
            Attribute::Id => self.id.as_deref(),
            Attribute::Name => self.name.as_deref(),
            Attribute::AriaLabel => self.aria_label.as_deref(),
            Attribute::Alt => self.alt.as_deref(),
            Attribute::Placeholder => self.placeholder.as_deref(),
            Attribute::LabelText => self.label_text.as_deref(),
            Attribute::Text => self.text.as_deref(),
            Attribute::Src => self.src.as_deref(),
            Attribute::Role => self.role.as_deref(),
            Attribute::ClassName => self.class_name.as_deref(),
        }
    }

    pub fn center(&self) -> Point {
        self.rect.center()
    }

    pub fn in_shadow_root(&self) -> bool {
        self.shadow_depth > 0
    }

    pub fn is_image_like(&self) -> bool {
        matches!(self.tag.as_str(), "img" | "svg" | "picture" | "canvas")
    }

    pub fn is_input_like(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea" | "select")
    }

    pub fn is_clickable(&self) -> bool {
        if matches!(self.tag.as_str(), "button" | "a") {
            return true;
        }
        if self.tag == "input"
            && let Some(kind) = &self.input_type
            && matches!(
                kind.to_lowercase().as_str(),
                "submit" | "button" | "reset" | "image"
            )
        {
            return true;
        }
        self.role.as_deref().is_some_and(|r| {
            matches!(
                r.to_lowercase().as_str(),
                "button" | "link" | "tab" | "menuitem" | "checkbox" | "radio" | "switch"
            )
        })
    }
}

/// One text region recognized in a viewport screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrToken {
    pub text: String,
    /// Corner points: top-left, top-right, bottom-right, bottom-left.
    pub polygon: [Point; 4],
    /// Recognition confidence in `[0, 1]`.
    pub confidence: f64,
}

impl OcrToken {
    /// Build a token from an axis-aligned box.
    pub fn from_box(text: impl Into<String>, rect: Rect, confidence: f64) -> Self {
        let right = rect.x + rect.width;
        let bottom = rect.y + rect.height;
        Self {
            text: text.into(),
            polygon: [
                Point::new(rect.x, rect.y),
                Point::new(right, rect.y),
                Point::new(right, bottom),
                Point::new(rect.x, bottom),
            ],
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Mean of the four polygon corners.
    pub fn center(&self) -> Point {
        let (sx, sy) = self
            .polygon
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / 4.0, sy / 4.0)
    }

    /// Rescale device-pixel coordinates into CSS pixels.
    pub fn scaled(mut self, factor: f64) -> Self {
        for p in &mut self.polygon {
            p.x *= factor;
            p.y *= factor;
        }
        self
    }
}

/// The dominant interaction kind expressed by an intent.
///
/// Declaration order is the tie-break order during classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    Visual,
    Input,
    Action,
}

impl IntentCategory {
    pub const ALL: [IntentCategory; 3] = [
        IntentCategory::Visual,
        IntentCategory::Input,
        IntentCategory::Action,
    ];

    /// Whether an element belongs to the tag/role family this category expects.
    pub fn expects(&self, element: &ElementDescriptor) -> bool {
        match self {
            IntentCategory::Visual => element.is_image_like(),
            IntentCategory::Input => element.is_input_like(),
            IntentCategory::Action => element.is_clickable(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::Visual => "visual",
            IntentCategory::Input => "input",
            IntentCategory::Action => "action",
        }
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete lookup the live page understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "query", rename_all = "snake_case")]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    pub fn kind(&self) -> &'static str {
        match self {
            Selector::Css(_) => "css",
            Selector::XPath(_) => "xpath",
        }
    }

    pub fn query(&self) -> &str {
        match self {
            Selector::Css(q) | Selector::XPath(q) => q,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind(), self.query())
    }
}

/// Selector strategy synthesized for a candidate element, most stable first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LocatorStrategy {
    ById(String),
    ByName(String),
    ByAria { tag: String, label: String },
    ByTextExact { tag: String, text: String },
    ByTextContains { tag: String, text: String },
    ByAttributeXPath(String),
}

impl LocatorStrategy {
    pub fn kind(&self) -> &'static str {
        match self {
            LocatorStrategy::ById(_) => "id",
            LocatorStrategy::ByName(_) => "name",
            LocatorStrategy::ByAria { .. } => "aria",
            LocatorStrategy::ByTextExact { .. } => "text",
            LocatorStrategy::ByTextContains { .. } => "text-contains",
            LocatorStrategy::ByAttributeXPath(_) => "xpath",
        }
    }

    /// The lookup value carried by the strategy.
    pub fn value(&self) -> &str {
        match self {
            LocatorStrategy::ById(v)
            | LocatorStrategy::ByName(v)
            | LocatorStrategy::ByAttributeXPath(v) => v,
            LocatorStrategy::ByAria { label, .. } => label,
            LocatorStrategy::ByTextExact { text, .. }
            | LocatorStrategy::ByTextContains { text, .. } => text,
        }
    }

    /// Translate into a CSS or XPath query for the page.
    pub fn selector(&self) -> Selector {
        match self {
            LocatorStrategy::ById(id) => Selector::Css(format!("[id={}]", css_string(id))),
            LocatorStrategy::ByName(name) => {
                Selector::Css(format!("[name={}]", css_string(name)))
            }
            LocatorStrategy::ByAria { tag, label } => Selector::XPath(format!(
                "//{}[@aria-label={}]",
                xpath_tag(tag),
                xpath_literal(label)
            )),
            LocatorStrategy::ByTextExact { tag, text } => Selector::XPath(format!(
                "//{}[normalize-space(.)={}]",
                xpath_tag(tag),
                xpath_literal(text)
            )),
            LocatorStrategy::ByTextContains { tag, text } => Selector::XPath(format!(
                "//{}[contains(normalize-space(.),{})]",
                xpath_tag(tag),
                xpath_literal(text)
            )),
            LocatorStrategy::ByAttributeXPath(xpath) => Selector::XPath(xpath.clone()),
        }
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorStrategy::ById(v) => write!(f, "id={:?}", v),
            LocatorStrategy::ByName(v) => write!(f, "name={:?}", v),
            LocatorStrategy::ByAria { tag, label } => write!(f, "aria[{}]={:?}", tag, label),
            LocatorStrategy::ByTextExact { tag, text } => write!(f, "text[{}]={:?}", tag, text),
            LocatorStrategy::ByTextContains { tag, text } => {
                write!(f, "text~[{}]={:?}", tag, text)
            }
            LocatorStrategy::ByAttributeXPath(v) => write!(f, "xpath={}", v),
        }
    }
}

/// Quote a string as an XPath 1.0 literal.
///
/// XPath has no escape sequences, so values holding both quote kinds are
/// assembled with `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Quote a string for use inside a CSS attribute selector.
pub fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\a "),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Node test for a tag name. SVG lives in its own namespace, so a bare
/// `//svg` never matches inside an HTML document.
pub fn xpath_tag(tag: &str) -> String {
    let clean: String = tag
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    match clean.as_str() {
        "" => "*".to_string(),
        "svg" => "*[local-name()='svg']".to_string(),
        _ => clean,
    }
}

/// Live state of one element matched by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchedElement {
    pub visible: bool,
    pub enabled: bool,
}

impl MatchedElement {
    pub fn is_interactable(&self) -> bool {
        self.visible && self.enabled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Confirmed against the live page: exactly one visible, enabled match.
    Verified,
}

/// A selector strategy that was proven unique on the live page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocator {
    pub strategy: LocatorStrategy,
    pub status: VerificationStatus,
    /// Composite score of the candidate that produced the strategy.
    pub score: f64,
    pub category: IntentCategory,
}

impl ResolvedLocator {
    pub fn selector(&self) -> Selector {
        self.strategy.selector()
    }
}

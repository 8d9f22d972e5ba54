use lodestar_common::protocol::{Attribute, IntentCategory};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LodestarConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: AttributeWeights,
    #[serde(default = "default_unstable_weight")]
    pub unstable_weight: f64,
    #[serde(default = "default_unstable_min_length")]
    pub unstable_min_length: usize,
    #[serde(default = "default_unstable_digit_ratio")]
    pub unstable_digit_ratio: f64,
    #[serde(default = "default_category_penalty")]
    pub category_penalty: f64,
    #[serde(default = "default_anchor_threshold")]
    pub anchor_threshold: f64,
    #[serde(default = "default_proximity_radius_px")]
    pub proximity_radius_px: f64,
    #[serde(default = "default_proximity_max_bonus")]
    pub proximity_max_bonus: f64,
    #[serde(default = "default_visual_fallback_multiplier")]
    pub visual_fallback_multiplier: f64,
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,
    /// Cap on how many ranked candidates enter verification.
    #[serde(default)]
    pub max_candidates: Option<usize>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: AttributeWeights::default(),
            unstable_weight: default_unstable_weight(),
            unstable_min_length: default_unstable_min_length(),
            unstable_digit_ratio: default_unstable_digit_ratio(),
            category_penalty: default_category_penalty(),
            anchor_threshold: default_anchor_threshold(),
            proximity_radius_px: default_proximity_radius_px(),
            proximity_max_bonus: default_proximity_max_bonus(),
            visual_fallback_multiplier: default_visual_fallback_multiplier(),
            confidence_floor: default_confidence_floor(),
            max_candidates: None,
        }
    }
}

fn default_unstable_weight() -> f64 {
    0.05
}

fn default_unstable_min_length() -> usize {
    6
}

fn default_unstable_digit_ratio() -> f64 {
    0.4
}

fn default_category_penalty() -> f64 {
    0.2
}

fn default_anchor_threshold() -> f64 {
    75.0
}

fn default_proximity_radius_px() -> f64 {
    500.0
}

fn default_proximity_max_bonus() -> f64 {
    100.0
}

fn default_visual_fallback_multiplier() -> f64 {
    150.0
}

fn default_confidence_floor() -> f64 {
    40.0
}

/// Per-attribute weights for fuzzy attribute scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeWeights {
    pub id: f64,
    pub name: f64,
    pub aria_label: f64,
    pub alt: f64,
    pub placeholder: f64,
    pub label_text: f64,
    pub text: f64,
    pub src: f64,
    pub role: f64,
    pub class_name: f64,
}

impl Default for AttributeWeights {
    fn default() -> Self {
        Self {
            id: 1.0,
            name: 0.9,
            aria_label: 0.9,
            alt: 0.8,
            placeholder: 0.8,
            label_text: 0.8,
            text: 0.7,
            src: 0.5,
            role: 0.4,
            class_name: 0.2,
        }
    }
}

impl AttributeWeights {
    pub fn weight(&self, attr: Attribute) -> f64 {
        match attr {
            Attribute::Id => self.id,
            Attribute::Name => self.name,
            Attribute::AriaLabel => self.aria_label,
            Attribute::Alt => self.alt,
            Attribute::Placeholder => self.placeholder,
            Attribute::LabelText => self.label_text,
            Attribute::Text => self.text,
            Attribute::Src => self.src,
            Attribute::Role => self.role,
            Attribute::ClassName => self.class_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// How long a single attempt waits for the selector to appear.
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Upper bound on one DOM round trip.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_text_prefix_len")]
    pub text_prefix_len: usize,
    #[serde(default = "default_min_src_fragment_len")]
    pub min_src_fragment_len: usize,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            wait_ms: default_wait_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            text_prefix_len: default_text_prefix_len(),
            min_src_fragment_len: default_min_src_fragment_len(),
        }
    }
}

fn default_wait_ms() -> u64 {
    1200
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_probe_timeout_ms() -> u64 {
    2000
}

fn default_text_prefix_len() -> usize {
    15
}

fn default_min_src_fragment_len() -> usize {
    4
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub prototypes: PrototypeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum EmbeddingConfig {
    WordVectors {
        path: PathBuf,
    },
    Http {
        endpoint: String,
        model: String,
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
    },
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig::WordVectors {
            path: default_vectors_path(),
        }
    }
}

fn default_api_key_env() -> String {
    "LODESTAR_EMBEDDING_KEY".to_string()
}

fn default_vectors_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("lodestar").join("vectors.txt"))
        .unwrap_or_else(|| PathBuf::from("vectors.txt"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ocr_binary")]
    pub binary: String,
    #[serde(default = "default_ocr_language")]
    pub language: String,
    /// Bound on one recognition pass; slower scans are treated as failed.
    #[serde(default = "default_ocr_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: default_ocr_enabled(),
            binary: default_ocr_binary(),
            language: default_ocr_language(),
            timeout_ms: default_ocr_timeout_ms(),
        }
    }
}

fn default_ocr_enabled() -> bool {
    true
}

fn default_ocr_binary() -> String {
    "tesseract".to_string()
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

fn default_ocr_timeout_ms() -> u64 {
    10_000
}

/// Canonical phrases each category prototype is embedded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrototypeConfig {
    pub visual: String,
    pub input: String,
    pub action: String,
}

impl Default for PrototypeConfig {
    fn default() -> Self {
        Self {
            visual: "logo branding icon image graphic picture banner".to_string(),
            input: "textbox input field textarea typing entry username password".to_string(),
            action: "button link click submit press toggle signin login".to_string(),
        }
    }
}

impl PrototypeConfig {
    pub fn phrase(&self, category: IntentCategory) -> &str {
        match category {
            IntentCategory::Visual => &self.visual,
            IntentCategory::Input => &self.input,
            IntentCategory::Action => &self.action,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// JSON locator repository persisted across runs.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            path: None,
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

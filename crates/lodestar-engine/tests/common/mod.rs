#![allow(dead_code)]

use async_trait::async_trait;
use lodestar_common::protocol::{ElementDescriptor, MatchedElement, OcrToken, Rect, Selector};
use lodestar_engine::backend::{Backend, BackendError, NavigationResult};
use lodestar_engine::config::LodestarConfig;
use lodestar_engine::config::schema::PrototypeConfig;
use lodestar_engine::models::embedding::{Embedder, WordVectors};
use lodestar_engine::models::ocr::TextRecognizer;
use lodestar_engine::models::{ModelError, ModelService};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

pub const LIVE: MatchedElement = MatchedElement {
    visible: true,
    enabled: true,
};

/// A page whose DOM is a list of descriptors plus a table of what each
/// selector currently matches.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub elements: Vec<ElementDescriptor>,
    pub live: HashMap<String, Vec<MatchedElement>>,
    pub pixel_ratio: f64,
    pub fail_extract: bool,
    pub extract_calls: usize,
    pub probes: Vec<String>,
}

impl MockBackend {
    pub fn new(elements: Vec<ElementDescriptor>) -> Self {
        Self {
            elements,
            pixel_ratio: 1.0,
            ..Default::default()
        }
    }

    /// Make a selector match `count` visible, enabled elements.
    pub fn set_live(&mut self, selector: Selector, count: usize) {
        self.live
            .insert(selector.query().to_string(), vec![LIVE; count]);
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
    async fn close(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
    async fn is_ready(&self) -> bool {
        true
    }
    async fn navigate(&mut self, _url: &str) -> Result<NavigationResult, BackendError> {
        Err(BackendError::NotSupported("navigate".into()))
    }

    async fn evaluate(&mut self, expression: &str) -> Result<Value, BackendError> {
        if expression == lodestar_scanner::EXTRACT_JS {
            self.extract_calls += 1;
            if self.fail_extract {
                return Err(BackendError::Script("Execution context was destroyed".into()));
            }
            return Ok(serde_json::to_value(&self.elements)?);
        }
        if expression == "window.devicePixelRatio" {
            return Ok(json!(self.pixel_ratio));
        }
        Err(BackendError::Script(format!("unexpected expression: {}", expression)))
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn find_all(&mut self, selector: &Selector) -> Result<Vec<MatchedElement>, BackendError> {
        self.probes.push(selector.query().to_string());
        Ok(self.live.get(selector.query()).cloned().unwrap_or_default())
    }
}

/// Recognizer returning fixed tokens, or failing when `tokens` is `None`.
pub struct FixedRecognizer {
    pub tokens: Option<Vec<OcrToken>>,
}

#[async_trait]
impl TextRecognizer for FixedRecognizer {
    async fn recognize(&self, _png: &[u8]) -> Result<Vec<OcrToken>, ModelError> {
        self.tokens
            .clone()
            .ok_or_else(|| ModelError::Recognition("tesseract crashed".into()))
    }
}

/// Recognizer that never answers.
pub struct StalledRecognizer;

#[async_trait]
impl TextRecognizer for StalledRecognizer {
    async fn recognize(&self, _png: &[u8]) -> Result<Vec<OcrToken>, ModelError> {
        std::future::pending().await
    }
}

/// Word vectors behind an endpoint-like contract: an empty batch is a bad
/// request, as OpenAI-compatible servers answer it.
pub struct StrictEmbedder(pub WordVectors);

#[async_trait]
impl Embedder for StrictEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        self.0.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        if texts.is_empty() {
            return Err(ModelError::Embedding("400 Bad Request: empty input".into()));
        }
        self.0.embed_batch(texts).await
    }
}

/// Word vectors over four axes: visual, input, action, misc.
pub fn vectors() -> WordVectors {
    let entries: Vec<(&str, [f32; 4])> = vec![
        ("logo", [1.0, 0.0, 0.0, 0.0]),
        ("company", [1.0, 0.0, 0.0, 0.2]),
        ("img", [1.0, 0.0, 0.0, 0.0]),
        ("username", [0.0, 1.0, 0.0, 0.0]),
        ("input", [0.0, 1.0, 0.0, 0.0]),
        ("enter", [0.0, 1.0, 0.0, 0.0]),
        ("textbox", [0.0, 1.0, 0.0, 0.0]),
        ("password", [0.0, 1.0, 0.0, 0.3]),
        ("login", [0.0, 0.0, 1.0, 0.0]),
        ("click", [0.0, 0.0, 1.0, 0.0]),
        ("button", [0.0, 0.0, 1.0, 0.0]),
        ("submit", [0.0, 0.0, 1.0, 0.2]),
    ];
    WordVectors::from_entries(
        entries
            .into_iter()
            .map(|(w, v)| (w.to_string(), v.to_vec())),
    )
}

pub async fn models(recognizer: Option<Box<dyn TextRecognizer>>) -> Arc<ModelService> {
    models_with(Box::new(vectors()), recognizer).await
}

pub async fn models_with(
    embedder: Box<dyn Embedder>,
    recognizer: Option<Box<dyn TextRecognizer>>,
) -> Arc<ModelService> {
    Arc::new(
        ModelService::with_providers(embedder, recognizer, &PrototypeConfig::default())
            .await
            .unwrap(),
    )
}

/// Defaults, but without the presence wait.
pub fn config() -> LodestarConfig {
    let mut config = LodestarConfig::default();
    config.verification.wait_ms = 0;
    config.verification.poll_interval_ms = 1;
    config
}

pub fn rect(x: f64, y: f64) -> Rect {
    Rect {
        x,
        y,
        width: 100.0,
        height: 30.0,
    }
}

pub fn input_named(name: &str) -> ElementDescriptor {
    let mut element = ElementDescriptor::new("input");
    element.name = Some(name.to_string());
    element.rect = rect(10.0, 10.0);
    element
}

pub fn button(text: &str) -> ElementDescriptor {
    let mut element = ElementDescriptor::new("button");
    element.text = Some(text.to_string());
    element.rect = rect(10.0, 100.0);
    element
}

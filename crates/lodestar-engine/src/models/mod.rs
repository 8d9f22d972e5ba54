pub mod embedding;
pub mod ocr;

use crate::config::schema::{EmbeddingConfig, ModelConfig, PrototypeConfig};
use embedding::{Embedder, HttpEmbedder, WordVectors};
use lodestar_common::protocol::IntentCategory;
use ocr::{TesseractRecognizer, TextRecognizer};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to load model: {0}")]
    Load(String),
    #[error("Embedding failed: {0}")]
    Embedding(String),
    #[error("Text recognition failed: {0}")]
    Recognition(String),
}

/// Owns the embedding and text-recognition providers plus the category
/// prototype vectors. Built once, then shared read-only (behind `Arc`) by
/// every engine.
pub struct ModelService {
    embedder: Box<dyn Embedder>,
    recognizer: Option<Box<dyn TextRecognizer>>,
    prototypes: [Vec<f32>; 3],
}

impl ModelService {
    /// Build providers from configuration. Any failure here is fatal.
    pub async fn init(config: &ModelConfig) -> Result<Self, ModelError> {
        let embedder: Box<dyn Embedder> = match &config.embedding {
            EmbeddingConfig::WordVectors { path } => Box::new(WordVectors::load(path).await?),
            EmbeddingConfig::Http {
                endpoint,
                model,
                api_key_env,
            } => Box::new(HttpEmbedder::new(endpoint, model, api_key_env)),
        };

        let recognizer: Option<Box<dyn TextRecognizer>> = if config.ocr.enabled {
            let tesseract = TesseractRecognizer::new(&config.ocr.binary, &config.ocr.language);
            tesseract.probe().await?;
            Some(Box::new(tesseract))
        } else {
            None
        };

        Self::with_providers(embedder, recognizer, &config.prototypes).await
    }

    /// Assemble a service from already-constructed providers.
    pub async fn with_providers(
        embedder: Box<dyn Embedder>,
        recognizer: Option<Box<dyn TextRecognizer>>,
        phrases: &PrototypeConfig,
    ) -> Result<Self, ModelError> {
        let texts: Vec<String> = IntentCategory::ALL
            .iter()
            .map(|c| phrases.phrase(*c).to_lowercase())
            .collect();
        let vectors = embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| ModelError::Load(format!("category prototypes: {}", e)))?;

        let prototypes: [Vec<f32>; 3] = vectors.try_into().map_err(|v: Vec<Vec<f32>>| {
            ModelError::Load(format!("expected 3 prototype vectors, got {}", v.len()))
        })?;

        info!(
            "Model service ready (ocr: {})",
            if recognizer.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            embedder,
            recognizer,
            prototypes,
        })
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn recognizer(&self) -> Option<&dyn TextRecognizer> {
        self.recognizer.as_deref()
    }

    pub fn prototype(&self, category: IntentCategory) -> &[f32] {
        let index = match category {
            IntentCategory::Visual => 0,
            IntentCategory::Input => 1,
            IntentCategory::Action => 2,
        };
        &self.prototypes[index]
    }

    /// Release provider resources.
    pub async fn shutdown(&self) {
        self.embedder.shutdown().await;
        info!("Model service shut down");
    }
}

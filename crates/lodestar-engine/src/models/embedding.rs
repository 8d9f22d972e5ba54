use super::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError>;

    /// Embed several texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Release any held resources.
    async fn shutdown(&self) {}
}

/// Cosine similarity of two vectors, clamped to `[-1, 1]`.
///
/// Empty, mismatched or zero-norm inputs have similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na <= f64::EPSILON || nb <= f64::EPSILON {
        return 0.0;
    }
    (dot / (na.sqrt() * nb.sqrt())).clamp(-1.0, 1.0)
}

/// Static word vectors; a text embeds as the mean of its known word vectors.
pub struct WordVectors {
    vectors: HashMap<String, Vec<f32>>,
    dimension: usize,
}

impl WordVectors {
    /// Load a GloVe or word2vec text-format file.
    pub async fn load(path: &Path) -> Result<Self, ModelError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ModelError::Load(format!("{}: {}", path.display(), e)))?;
        let vectors = Self::parse(&content)?;
        info!(
            "Loaded {} word vectors ({} dims) from {}",
            vectors.len(),
            vectors.dimension,
            path.display()
        );
        Ok(vectors)
    }

    pub fn parse(content: &str) -> Result<Self, ModelError> {
        let mut vectors = HashMap::new();
        let mut dimension = 0usize;

        for (lineno, line) in content.lines().enumerate() {
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };
            let rest: Vec<&str> = fields.collect();

            // word2vec header: "<count> <dims>"
            if lineno == 0 && rest.len() == 1 && word.parse::<usize>().is_ok() {
                continue;
            }

            let values = rest
                .iter()
                .map(|v| v.parse::<f32>())
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|e| ModelError::Load(format!("line {}: {}", lineno + 1, e)))?;

            if values.is_empty() {
                return Err(ModelError::Load(format!(
                    "line {}: no vector components",
                    lineno + 1
                )));
            }
            if dimension == 0 {
                dimension = values.len();
            } else if values.len() != dimension {
                return Err(ModelError::Load(format!(
                    "line {}: expected {} components, found {}",
                    lineno + 1,
                    dimension,
                    values.len()
                )));
            }
            vectors.insert(word.to_lowercase(), values);
        }

        if vectors.is_empty() {
            return Err(ModelError::Load("vector file contains no entries".into()));
        }
        Ok(Self { vectors, dimension })
    }

    /// Build from in-memory entries. All vectors must share one dimension.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Vec<f32>)>) -> Self {
        let vectors: HashMap<String, Vec<f32>> = entries
            .into_iter()
            .map(|(w, v)| (w.to_lowercase(), v))
            .collect();
        let dimension = vectors.values().map(Vec::len).next().unwrap_or(0);
        Self { vectors, dimension }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn average(&self, text: &str) -> Vec<f32> {
        let mut sum = vec![0.0f32; self.dimension];
        let mut known = 0usize;
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            if let Some(v) = self.vectors.get(token) {
                for (s, x) in sum.iter_mut().zip(v) {
                    *s += x;
                }
                known += 1;
            }
        }
        if known > 0 {
            for s in &mut sum {
                *s /= known as f32;
            }
        }
        sum
    }
}

#[async_trait]
impl Embedder for WordVectors {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        Ok(self.average(text))
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(endpoint: &str, model: &str, api_key_env: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/embeddings", endpoint.trim_end_matches('/')),
            model: model.to_string(),
            api_key: std::env::var(api_key_env).ok().filter(|k| !k.is_empty()),
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let mut batch = self.embed_batch(&[text.to_string()]).await?;
        batch
            .pop()
            .ok_or_else(|| ModelError::Embedding("empty embedding response".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        // Endpoints reject an empty `input` list.
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut request = self.client.post(&self.url).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ModelError::Embedding(e.to_string()))?
            .error_for_status()
            .map_err(|e| ModelError::Embedding(e.to_string()))?;
        let mut body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Embedding(e.to_string()))?;

        if body.data.len() != texts.len() {
            return Err(ModelError::Embedding(format!(
                "requested {} embeddings, received {}",
                texts.len(),
                body.data.len()
            )));
        }
        body.data.sort_by_key(|d| d.index);
        debug!("Embedded {} texts via {}", texts.len(), self.url);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

use super::cache::ResolutionCache;
use super::classifier::category_for;
use super::extractor::extract;
use super::result::ResolveError;
use super::scorer::{Candidate, Scorer, identity_text};
use super::synthesizer::strategies;
use super::verifier::Verifier;
use super::visual::scan;
use crate::backend::Backend;
use crate::config::LodestarConfig;
use crate::models::ModelService;
use crate::models::embedding::cosine_similarity;
use lodestar_common::protocol::{
    ElementDescriptor, IntentCategory, OcrToken, ResolvedLocator, VerificationStatus,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Classified category and ranked candidates for one intent.
#[derive(Debug, Clone, Serialize)]
pub struct Ranking {
    pub intent: String,
    pub category: IntentCategory,
    pub candidates: Vec<Candidate>,
}

/// One extraction + visual scan, reusable across intents.
struct PageSnapshot {
    elements: Vec<ElementDescriptor>,
    identities: Vec<Vec<f32>>,
    tokens: Vec<OcrToken>,
}

pub struct LocatorEngine {
    models: Arc<ModelService>,
    config: LodestarConfig,
    cache: Option<ResolutionCache>,
}

impl LocatorEngine {
    /// Engine with an in-memory cache (when caching is enabled).
    pub fn new(models: Arc<ModelService>, config: LodestarConfig) -> Self {
        let cache = config.cache.enabled.then(ResolutionCache::new);
        Self {
            models,
            config,
            cache,
        }
    }

    /// Engine whose cache is backed by the configured locator repository.
    pub async fn with_cache(models: Arc<ModelService>, config: LodestarConfig) -> Self {
        let cache = match (&config.cache.path, config.cache.enabled) {
            (Some(path), true) => Some(ResolutionCache::open(path).await),
            (None, true) => Some(ResolutionCache::new()),
            (_, false) => None,
        };
        Self {
            models,
            config,
            cache,
        }
    }

    pub fn config(&self) -> &LodestarConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&ResolutionCache> {
        self.cache.as_ref()
    }

    /// Resolve an intent to a verified, unique locator.
    pub async fn resolve(
        &mut self,
        backend: &mut dyn Backend,
        intent: &str,
    ) -> Result<ResolvedLocator, ResolveError> {
        if let Some(hit) = self.cached(backend, intent).await {
            return Ok(hit);
        }
        let snapshot = self.snapshot(backend).await?;
        let resolved = self.resolve_on(backend, &snapshot, intent).await?;
        self.persist_cache().await;
        Ok(resolved)
    }

    /// Resolve several intents. Cache misses share one page snapshot, and
    /// every intent gets its own result.
    pub async fn resolve_batch(
        &mut self,
        backend: &mut dyn Backend,
        intents: &[String],
    ) -> Vec<Result<ResolvedLocator, ResolveError>> {
        let mut results = Vec::with_capacity(intents.len());
        let mut snapshot: Option<PageSnapshot> = None;

        for intent in intents {
            if let Some(hit) = self.cached(backend, intent).await {
                results.push(Ok(hit));
                continue;
            }
            if snapshot.is_none() {
                match self.snapshot(backend).await {
                    Ok(s) => snapshot = Some(s),
                    Err(e) => {
                        results.push(Err(e));
                        continue;
                    }
                }
            }
            if let Some(snapshot) = &snapshot {
                results.push(self.resolve_on(backend, snapshot, intent).await);
            }
        }

        self.persist_cache().await;
        results
    }

    /// Score candidates without verifying or caching anything.
    pub async fn rank(
        &self,
        backend: &mut dyn Backend,
        intent: &str,
    ) -> Result<Ranking, ResolveError> {
        let snapshot = self.snapshot(backend).await?;
        self.rank_snapshot(&snapshot, intent).await
    }

    /// Flush the cache to its repository file. Failures only warn.
    pub async fn persist_cache(&self) {
        if let Some(cache) = &self.cache
            && let Err(e) = cache.persist().await
        {
            warn!("Failed to persist locator cache: {}", e);
        }
    }

    async fn cached(&mut self, backend: &mut dyn Backend, intent: &str) -> Option<ResolvedLocator> {
        let verifier = Verifier::new(&self.config.verification);
        let cache = self.cache.as_mut()?;
        cache.lookup(backend, &verifier, intent).await
    }

    async fn resolve_on(
        &mut self,
        backend: &mut dyn Backend,
        snapshot: &PageSnapshot,
        intent: &str,
    ) -> Result<ResolvedLocator, ResolveError> {
        let ranking = self.rank_snapshot(snapshot, intent).await?;
        let resolved = self.waterfall(backend, &ranking).await?;
        info!(
            "Resolved '{}' -> {} (score {:.1}, {})",
            intent, resolved.strategy, resolved.score, resolved.category
        );

        if let Some(cache) = self.cache.as_mut() {
            cache.store(intent, resolved.clone());
        }
        Ok(resolved)
    }

    async fn snapshot(&self, backend: &mut dyn Backend) -> Result<PageSnapshot, ResolveError> {
        let elements = extract(backend).await?;
        if elements.is_empty() {
            debug!("Page snapshot has no candidate elements");
            return Ok(PageSnapshot {
                elements,
                identities: Vec::new(),
                tokens: Vec::new(),
            });
        }

        let tokens = match self.models.recognizer() {
            Some(recognizer) => {
                let limit = Duration::from_millis(self.config.models.ocr.timeout_ms);
                scan(backend, recognizer, limit).await.unwrap_or_else(|e| {
                    warn!("Visual scan unavailable, continuing without anchors: {}", e);
                    Vec::new()
                })
            }
            None => Vec::new(),
        };

        let texts: Vec<String> = elements
            .iter()
            .map(|e| identity_text(e, &self.config.scoring))
            .collect();
        let identities = self.models.embedder().embed_batch(&texts).await?;

        Ok(PageSnapshot {
            elements,
            identities,
            tokens,
        })
    }

    async fn rank_snapshot(
        &self,
        snapshot: &PageSnapshot,
        intent: &str,
    ) -> Result<Ranking, ResolveError> {
        let intent_text = intent.trim().to_lowercase();
        let intent_vector = self.models.embedder().embed(&intent_text).await?;
        let category = category_for(&self.models, &intent_vector);
        debug!("Intent '{}' classified as {}", intent_text, category);

        let similarities: Vec<f64> = snapshot
            .identities
            .iter()
            .map(|v| cosine_similarity(&intent_vector, v))
            .collect();

        let candidates = Scorer::new(&self.config.scoring).score(
            &intent_text,
            &snapshot.elements,
            &similarities,
            &snapshot.tokens,
            category,
        );

        Ok(Ranking {
            intent: intent.to_string(),
            category,
            candidates,
        })
    }

    async fn waterfall(
        &self,
        backend: &mut dyn Backend,
        ranking: &Ranking,
    ) -> Result<ResolvedLocator, ResolveError> {
        let verifier = Verifier::new(&self.config.verification);
        let limit = self
            .config
            .scoring
            .max_candidates
            .unwrap_or(ranking.candidates.len());

        let mut tried = HashSet::new();
        let mut attempted = Vec::new();

        for candidate in ranking.candidates.iter().take(limit) {
            for strategy in strategies(
                &candidate.element,
                &self.config.scoring,
                &self.config.verification,
            ) {
                if !tried.insert(strategy.clone()) {
                    continue;
                }
                attempted.push(strategy.to_string());
                if verifier.verify(backend, &strategy).await.is_ok() {
                    return Ok(ResolvedLocator {
                        strategy,
                        status: VerificationStatus::Verified,
                        score: candidate.score,
                        category: ranking.category,
                    });
                }
            }
        }

        Err(ResolveError::NotFound {
            intent: ranking.intent.clone(),
            candidates: ranking.candidates.len(),
            attempted,
        })
    }
}

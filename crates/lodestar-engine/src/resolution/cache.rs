use super::verifier::Verifier;
use crate::backend::Backend;
use lodestar_common::protocol::ResolvedLocator;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub locator: ResolvedLocator,
    /// Seconds since the Unix epoch.
    pub stored_at: u64,
}

/// Intent → last verified locator. Entries are re-verified on every lookup.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<String, CacheEntry>,
    path: Option<PathBuf>,
}

/// Cache key for an intent: trimmed, lower-cased, whitespace collapsed.
pub fn normalize_key(intent: &str) -> String {
    intent
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a persisted locator repository. A missing file starts empty; an
    /// unreadable one is discarded with a warning.
    pub async fn open(path: &Path) -> Self {
        let entries = match tokio::fs::read_to_string(path).await {
            Ok(content) => match serde_json::from_str::<HashMap<String, CacheEntry>>(&content) {
                Ok(entries) => {
                    info!("Loaded {} cached locators from {}", entries.len(), path.display());
                    entries
                }
                Err(e) => {
                    warn!("Ignoring malformed locator cache {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!("Failed to read locator cache {}: {}", path.display(), e);
                HashMap::new()
            }
        };
        Self {
            entries,
            path: Some(path.to_path_buf()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw entry, without verification. Not for serving results.
    pub fn peek(&self, intent: &str) -> Option<&CacheEntry> {
        self.entries.get(&normalize_key(intent))
    }

    /// Return the cached locator only if it still verifies on the live page.
    /// A failed re-verification evicts the entry.
    pub async fn lookup(
        &mut self,
        backend: &mut dyn Backend,
        verifier: &Verifier<'_>,
        intent: &str,
    ) -> Option<ResolvedLocator> {
        let key = normalize_key(intent);
        let locator = self.entries.get(&key)?.locator.clone();

        match verifier.verify(backend, &locator.strategy).await {
            Ok(()) => {
                info!("Cache hit for '{}': {}", key, locator.strategy);
                Some(locator)
            }
            Err(rejection) => {
                info!("Cached locator for '{}' is stale ({})", key, rejection);
                self.entries.remove(&key);
                None
            }
        }
    }

    pub fn store(&mut self, intent: &str, locator: ResolvedLocator) {
        let stored_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.entries
            .insert(normalize_key(intent), CacheEntry { locator, stored_at });
    }

    pub fn invalidate(&mut self, intent: &str) -> bool {
        self.entries.remove(&normalize_key(intent)).is_some()
    }

    /// Write entries back to the repository file, if one is configured.
    pub async fn persist(&self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        tokio::fs::write(path, json).await
    }
}

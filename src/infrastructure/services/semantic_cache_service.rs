//! Best-effort access to the semantic response cache

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::cache::CacheLookup;
use crate::domain::semantic_cache::{
    clamp_threshold, SemanticCacheConfig, SemanticCacheEntry, SemanticResponseCache,
};
use crate::infrastructure::observability::record_semantic_cache_lookup;

/// Wraps a [`SemanticResponseCache`] so that nothing it does can fail the caller.
///
/// Unconfigured, unreachable, slow or malformed responses all read as "not available".
#[derive(Debug)]
pub struct SemanticCacheService {
    cache: Arc<dyn SemanticResponseCache>,
    default_threshold: f32,
    timeout: Duration,
}

impl SemanticCacheService {
    pub fn new(cache: Arc<dyn SemanticResponseCache>, config: &SemanticCacheConfig) -> Self {
        Self {
            cache,
            default_threshold: clamp_threshold(config.similarity_threshold),
            timeout: config.timeout(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_configured()
    }

    pub fn default_threshold(&self) -> f32 {
        self.default_threshold
    }

    /// Stores a response; `false` when the cache is unavailable or the write failed
    pub async fn put(&self, prompt: &str, response: &str) -> bool {
        if !self.cache.is_configured() {
            return false;
        }

        let entry = SemanticCacheEntry::new(prompt, response);
        match tokio::time::timeout(self.timeout, self.cache.store(entry)).await {
            Ok(Ok(())) => {
                debug!("Stored response in semantic cache");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Semantic cache store failed");
                false
            }
            Err(_) => {
                warn!("Semantic cache store timed out");
                false
            }
        }
    }

    /// Looks up a response for a prompt similar to `prompt`.
    ///
    /// `threshold` falls back to the configured default and is clamped into `[0, 1]`.
    pub async fn lookup(&self, prompt: &str, threshold: Option<f32>) -> CacheLookup<String> {
        let lookup = self.search(prompt, threshold).await;
        record_semantic_cache_lookup(lookup.outcome());
        lookup
    }

    pub async fn get(&self, prompt: &str, threshold: Option<f32>) -> Option<String> {
        self.lookup(prompt, threshold).await.into_option()
    }

    async fn search(&self, prompt: &str, threshold: Option<f32>) -> CacheLookup<String> {
        if !self.cache.is_configured() {
            return CacheLookup::Unavailable;
        }

        let threshold = threshold.map(clamp_threshold).unwrap_or(self.default_threshold);

        match tokio::time::timeout(self.timeout, self.cache.search(prompt, threshold)).await {
            Ok(Ok(Some(entry))) => {
                debug!(threshold, "Semantic cache hit");
                CacheLookup::Hit(entry.response)
            }
            Ok(Ok(None)) => CacheLookup::Miss,
            Ok(Err(e)) => {
                warn!(error = %e, "Semantic cache search failed");
                CacheLookup::Unavailable
            }
            Err(_) => {
                warn!("Semantic cache search timed out");
                CacheLookup::Unavailable
            }
        }
    }
}

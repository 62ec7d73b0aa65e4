//! Semantic response cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings for the external semantic response cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    /// Service base URL; the cache is disabled when absent
    #[serde(default)]
    pub url: Option<String>,

    /// Bearer credential; the cache is disabled when absent
    #[serde(default)]
    pub api_key: Option<String>,

    /// Cache to address on the service
    #[serde(default = "default_cache_id")]
    pub cache_id: String,

    /// Similarity threshold for cache hits (0.0 to 1.0)
    /// Higher values require more similar prompts
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_cache_id() -> String {
    "default".to_string()
}

fn default_similarity_threshold() -> f32 {
    0.9
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            cache_id: default_cache_id(),
            similarity_threshold: default_similarity_threshold(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SemanticCacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether both endpoint and credential are present
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.url) && present(&self.api_key)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_cache_id(mut self, cache_id: impl Into<String>) -> Self {
        self.cache_id = cache_id.into();
        self
    }

    /// Set the similarity threshold
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = clamp_threshold(threshold);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }
}

/// Clamps a similarity threshold into `[0, 1]`
pub fn clamp_threshold(threshold: f32) -> f32 {
    if threshold.is_nan() {
        return default_similarity_threshold();
    }
    threshold.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SemanticCacheConfig::default();

        assert!(!config.is_configured());
        assert!((config.similarity_threshold - 0.9).abs() < 0.001);
        assert_eq!(config.cache_id, "default");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_configured_requires_url_and_key() {
        let only_url = SemanticCacheConfig::new().with_url("https://cache.example.com");
        assert!(!only_url.is_configured());

        let blank_key = only_url.clone().with_api_key("  ");
        assert!(!blank_key.is_configured());

        let full = only_url.with_api_key("secret");
        assert!(full.is_configured());
    }

    #[test]
    fn test_similarity_threshold_clamped() {
        let config = SemanticCacheConfig::new().with_similarity_threshold(1.5);
        assert!((config.similarity_threshold - 1.0).abs() < 0.001);

        let config = SemanticCacheConfig::new().with_similarity_threshold(-0.5);
        assert!(config.similarity_threshold.abs() < 0.001);
    }
}

//! Semantic response cache trait and types

use std::fmt::Debug;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A stored `(prompt, response)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticCacheEntry {
    pub prompt: String,
    pub response: String,
    /// Threshold the entry was looked up with, when it came from a search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
}

impl SemanticCacheEntry {
    pub fn new(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
            similarity_threshold: None,
        }
    }
}

/// External store matching prompts by meaning rather than exact text.
///
/// Implementations report transport problems as errors; callers decide
/// whether those degrade to a miss.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SemanticResponseCache: Send + Sync + Debug {
    /// Whether endpoint and credential are configured
    fn is_configured(&self) -> bool;

    /// Stores a response for a prompt
    async fn store(&self, entry: SemanticCacheEntry) -> Result<(), DomainError>;

    /// Finds the best stored response whose prompt is at least `threshold` similar
    async fn search(
        &self,
        prompt: &str,
        threshold: f32,
    ) -> Result<Option<SemanticCacheEntry>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serialization_skips_threshold() {
        let entry = SemanticCacheEntry::new("prompt", "response");
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value, serde_json::json!({"prompt": "prompt", "response": "response"}));
    }

    #[tokio::test]
    async fn test_automock_search() {
        let mut cache = MockSemanticResponseCache::new();
        cache
            .expect_search()
            .withf(|prompt, threshold| prompt == "hello" && (*threshold - 0.9).abs() < 0.001)
            .returning(|prompt, _| Ok(Some(SemanticCacheEntry::new(prompt, "hi"))));

        let entry = cache.search("hello", 0.9).await.unwrap().unwrap();
        assert_eq!(entry.response, "hi");
    }
}

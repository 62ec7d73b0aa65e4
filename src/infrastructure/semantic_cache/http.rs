//! HTTP client for a LangCache-style semantic response cache

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::semantic_cache::{
    clamp_threshold, SemanticCacheConfig, SemanticCacheEntry, SemanticResponseCache,
};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

/// Talks to `{url}/v1/caches/{cache_id}/entries[/search]` with a bearer token
#[derive(Debug)]
pub struct HttpSemanticCache<C: HttpClientTrait> {
    client: C,
    config: SemanticCacheConfig,
    auth_header: Option<String>,
}

impl<C: HttpClientTrait> HttpSemanticCache<C> {
    pub fn new(client: C, config: SemanticCacheConfig) -> Self {
        let auth_header = config
            .api_key
            .as_ref()
            .map(|key| format!("Bearer {}", key));

        Self {
            client,
            config,
            auth_header,
        }
    }

    fn entries_url(&self) -> Result<String, DomainError> {
        if !self.config.is_configured() {
            return Err(DomainError::configuration(
                "LANGCACHE_URL and LANGCACHE_API_KEY must both be set",
            ));
        }

        let base = self.config.url.as_deref().unwrap_or_default();
        Ok(format!(
            "{}/v1/caches/{}/entries",
            base.trim_end_matches('/'),
            self.config.cache_id
        ))
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_deref().unwrap_or_default()),
            ("Content-Type", "application/json"),
        ]
    }
}

#[async_trait]
impl<C: HttpClientTrait> SemanticResponseCache for HttpSemanticCache<C> {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn store(&self, entry: SemanticCacheEntry) -> Result<(), DomainError> {
        let url = self.entries_url()?;
        let body = serde_json::json!({
            "prompt": entry.prompt,
            "response": entry.response,
        });

        self.client
            .post_json(&url, self.headers(), &body)
            .await
            .map_err(|e| e.into_domain("semantic cache store", DomainError::cache))?;

        Ok(())
    }

    async fn search(
        &self,
        prompt: &str,
        threshold: f32,
    ) -> Result<Option<SemanticCacheEntry>, DomainError> {
        let url = format!("{}/search", self.entries_url()?);
        let threshold = clamp_threshold(threshold);
        let body = serde_json::json!({
            "prompt": prompt,
            "threshold": threshold,
        });

        let response = self
            .client
            .post_json(&url, self.headers(), &body)
            .await
            .map_err(|e| e.into_domain("semantic cache search", DomainError::cache))?;

        let parsed: SearchResponse = serde_json::from_value(response).map_err(|e| {
            DomainError::cache(format!("Failed to parse semantic cache response: {}", e))
        })?;

        Ok(parsed.entries.into_iter().next().map(|hit| SemanticCacheEntry {
            prompt: hit.prompt.unwrap_or_else(|| prompt.to_string()),
            response: hit.response,
            similarity_threshold: Some(threshold),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    entries: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    prompt: Option<String>,
    response: String,
}

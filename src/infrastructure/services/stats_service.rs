//! Health and size summary of every store the pipeline talks to

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::index::{CorpusIndex, IndexStats};
use crate::domain::semantic_cache::SemanticResponseCache;
use crate::infrastructure::cache::{CacheType, FastCacheHandle};

#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingStatus {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<IndexStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FastCacheStatus {
    pub backend: String,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub embedding: EmbeddingStatus,
    pub index: IndexStatus,
    pub fast_cache: FastCacheStatus,
    pub semantic_cache_enabled: bool,
}

/// Collects a [`StatsReport`]; store failures are reported, never returned
#[derive(Debug)]
pub struct StatsService {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn CorpusIndex>,
    fast_cache: Option<FastCacheHandle>,
    fast_cache_type: CacheType,
    semantic_cache: Arc<dyn SemanticResponseCache>,
}

impl StatsService {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn CorpusIndex>,
        semantic_cache: Arc<dyn SemanticResponseCache>,
    ) -> Self {
        Self {
            embedder,
            index,
            fast_cache: None,
            fast_cache_type: CacheType::Disabled,
            semantic_cache,
        }
    }

    pub fn with_fast_cache(mut self, cache: Option<FastCacheHandle>, cache_type: CacheType) -> Self {
        self.fast_cache_type = if cache.is_some() {
            cache_type
        } else {
            CacheType::Disabled
        };
        self.fast_cache = cache;
        self
    }

    pub async fn collect(&self) -> StatsReport {
        StatsReport {
            embedding: EmbeddingStatus {
                provider: self.embedder.provider_name().to_string(),
                model: self.embedder.model().to_string(),
                dimensions: self.embedder.dimensions(),
            },
            index: self.index_status().await,
            fast_cache: self.fast_cache_status().await,
            semantic_cache_enabled: self.semantic_cache.is_configured(),
        }
    }

    async fn index_status(&self) -> IndexStatus {
        let backend = self.index.backend_name().to_string();

        match self.index.stats().await {
            Ok(stats) => IndexStatus {
                backend,
                stats: Some(stats),
                error: None,
            },
            Err(e) => {
                warn!(error = %e, "Could not describe corpus index");
                IndexStatus {
                    backend,
                    stats: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn fast_cache_status(&self) -> FastCacheStatus {
        let unreachable = FastCacheStatus {
            backend: self.fast_cache_type.to_string(),
            reachable: false,
            entries: None,
        };

        let Some(handle) = &self.fast_cache else {
            return unreachable;
        };

        let cache = match handle.get().await {
            Ok(cache) => cache,
            Err(e) => {
                warn!(error = %e, "Fast cache unreachable");
                return unreachable;
            }
        };

        if let Err(e) = cache.ping().await {
            warn!(error = %e, "Fast cache ping failed");
            return unreachable;
        }

        FastCacheStatus {
            backend: cache.backend_name().to_string(),
            reachable: true,
            entries: cache.size().await.ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{Cache, MockCache};
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::index::{MockCorpusIndex, VectorRecord};
    use crate::domain::semantic_cache::MockSemanticResponseCache;
    use crate::domain::DomainError;
    use crate::infrastructure::lazy::LazyInit;

    fn semantic(configured: bool) -> Arc<dyn SemanticResponseCache> {
        let mut mock = MockSemanticResponseCache::new();
        mock.expect_is_configured().return_const(configured);
        Arc::new(mock)
    }

    #[tokio::test]
    async fn test_collect_reports_every_store() {
        let index = Arc::new(MockCorpusIndex::new());
        index
            .upsert(
                Some("video-prompts"),
                vec![VectorRecord::new("a", vec![0.1; 4], Default::default())],
            )
            .await
            .unwrap();
        let cache: Arc<dyn Cache> = Arc::new(MockCache::new().with_raw_entry("k", "[]"));

        let service = StatsService::new(Arc::new(MockEmbeddingProvider::new(4)), index, semantic(true))
            .with_fast_cache(Some(Arc::new(LazyInit::ready(cache))), CacheType::InMemory);

        let report = service.collect().await;

        assert_eq!(report.embedding.dimensions, 4);
        assert_eq!(report.embedding.model, "mock-embedding");
        let stats = report.index.stats.unwrap();
        assert_eq!(stats.total_vector_count, 1);
        assert_eq!(stats.namespace_count("video-prompts"), 1);
        assert!(report.fast_cache.reachable);
        assert_eq!(report.fast_cache.entries, Some(1));
        assert!(report.semantic_cache_enabled);
    }

    #[tokio::test]
    async fn test_unreachable_fast_cache() {
        let lazy = LazyInit::new(|| async {
            Err::<Arc<dyn Cache>, _>(DomainError::cache("connection refused"))
        });
        let service = StatsService::new(
            Arc::new(MockEmbeddingProvider::new(4)),
            Arc::new(MockCorpusIndex::new()),
            semantic(false),
        )
        .with_fast_cache(Some(Arc::new(lazy)), CacheType::Redis);

        let report = service.collect().await;

        assert_eq!(report.fast_cache.backend, "redis");
        assert!(!report.fast_cache.reachable);
        assert!(!report.semantic_cache_enabled);
    }

    #[tokio::test]
    async fn test_disabled_fast_cache() {
        let service = StatsService::new(
            Arc::new(MockEmbeddingProvider::new(4)),
            Arc::new(MockCorpusIndex::new()),
            semantic(false),
        )
        .with_fast_cache(None, CacheType::Redis);

        let report = service.collect().await;

        assert_eq!(report.fast_cache.backend, "disabled");
        assert!(!report.fast_cache.reachable);
    }
}

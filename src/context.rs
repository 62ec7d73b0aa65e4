//! Explicitly wired dependencies shared by the services

use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::index::CorpusIndex;
use crate::domain::ingestion::IngestionConfig;
use crate::domain::semantic_cache::SemanticResponseCache;
use crate::domain::{Cache, DomainError, SemanticCacheConfig};
use crate::infrastructure::cache::{lazy_fast_cache, CacheConfig, FastCacheHandle};
use crate::infrastructure::embedding::GeminiEmbeddingProvider;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::index::IndexFactory;
use crate::infrastructure::lazy::LazyInit;
use crate::infrastructure::semantic_cache::HttpSemanticCache;
use crate::infrastructure::services::{
    IngestionPipeline, QueryConfig, QueryOrchestrator, SemanticCacheService, StatsService,
};

/// Clients and settings the services are built from.
///
/// Nothing here is global: every service receives its dependencies from a
/// context, and tests build contexts out of fakes.
#[derive(Debug, Clone)]
pub struct RagContext {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn CorpusIndex>,
    fast_cache: Option<FastCacheHandle>,
    semantic_cache: Arc<dyn SemanticResponseCache>,
    cache_config: CacheConfig,
    semantic_cache_config: SemanticCacheConfig,
    query_config: QueryConfig,
    ingestion_config: IngestionConfig,
    namespace: Option<String>,
}

impl RagContext {
    pub fn builder() -> RagContextBuilder {
        RagContextBuilder::default()
    }

    /// Wires the production adapters described by `config`.
    ///
    /// Nothing connects here; missing credentials surface on first use.
    pub fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        let embedder = GeminiEmbeddingProvider::new(
            HttpClient::with_timeout(config.embedding.timeout())?,
            config.embedding.clone(),
        );
        let index = IndexFactory::new().create(&config.index, config.embedding.dimensions)?;
        let semantic_cache = HttpSemanticCache::new(
            HttpClient::with_timeout(config.semantic_cache.timeout())?,
            config.semantic_cache.clone(),
        );

        info!(
            model = %config.embedding.model,
            index = %config.index.backend,
            fast_cache = %config.fast_cache.backend,
            semantic_cache = config.semantic_cache.is_configured(),
            "Retrieval context configured"
        );

        RagContext::builder()
            .with_embedder(Arc::new(embedder))
            .with_index(index)
            .with_lazy_fast_cache(lazy_fast_cache(&config.fast_cache))
            .with_cache_config(config.fast_cache.clone())
            .with_semantic_cache(Arc::new(semantic_cache), config.semantic_cache.clone())
            .with_query_config(config.query.clone())
            .with_ingestion_config(config.ingestion.clone())
            .with_namespace(config.index.namespace.clone())
            .build()
    }

    pub fn query_orchestrator(&self) -> QueryOrchestrator {
        QueryOrchestrator::new(self.embedder.clone(), self.index.clone())
            .with_fast_cache(self.fast_cache.clone())
            .with_cache_config(&self.cache_config)
            .with_namespace(self.namespace.clone())
            .with_config(self.query_config.clone())
    }

    pub fn ingestion_pipeline(&self) -> Result<IngestionPipeline, DomainError> {
        self.ingestion_pipeline_with(self.ingestion_config.clone())
    }

    /// Pipeline with per-run settings; an unset namespace falls back to the index namespace
    pub fn ingestion_pipeline_with(
        &self,
        mut config: IngestionConfig,
    ) -> Result<IngestionPipeline, DomainError> {
        if config.namespace.is_none() {
            config.namespace = self.namespace.clone();
        }
        Ok(
            IngestionPipeline::new(self.embedder.clone(), self.index.clone(), config)?
                .with_fast_cache(self.fast_cache.clone())
                .with_cache_config(&self.cache_config),
        )
    }

    pub fn semantic_cache_service(&self) -> SemanticCacheService {
        SemanticCacheService::new(self.semantic_cache.clone(), &self.semantic_cache_config)
    }

    pub fn stats_service(&self) -> StatsService {
        StatsService::new(
            self.embedder.clone(),
            self.index.clone(),
            self.semantic_cache.clone(),
        )
        .with_fast_cache(self.fast_cache.clone(), self.cache_config.backend)
    }

    pub fn ingestion_config(&self) -> &IngestionConfig {
        &self.ingestion_config
    }

    pub fn query_config(&self) -> &QueryConfig {
        &self.query_config
    }
}

/// Builder for [`RagContext`]; embedder and index are required
#[derive(Default)]
pub struct RagContextBuilder {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<Arc<dyn CorpusIndex>>,
    fast_cache: Option<FastCacheHandle>,
    semantic_cache: Option<(Arc<dyn SemanticResponseCache>, SemanticCacheConfig)>,
    cache_config: CacheConfig,
    query_config: QueryConfig,
    ingestion_config: IngestionConfig,
    namespace: Option<String>,
}

impl RagContextBuilder {
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_index(mut self, index: Arc<dyn CorpusIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Uses an already connected fast cache
    pub fn with_fast_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.fast_cache = Some(Arc::new(LazyInit::ready(cache)));
        self
    }

    pub fn with_lazy_fast_cache(mut self, cache: Option<FastCacheHandle>) -> Self {
        self.fast_cache = cache;
        self
    }

    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    pub fn with_semantic_cache(
        mut self,
        cache: Arc<dyn SemanticResponseCache>,
        config: SemanticCacheConfig,
    ) -> Self {
        self.semantic_cache = Some((cache, config));
        self
    }

    pub fn with_query_config(mut self, config: QueryConfig) -> Self {
        self.query_config = config;
        self
    }

    pub fn with_ingestion_config(mut self, config: IngestionConfig) -> Self {
        self.ingestion_config = config;
        self
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn build(self) -> Result<RagContext, DomainError> {
        let embedder = self
            .embedder
            .ok_or_else(|| DomainError::configuration("an embedding provider is required"))?;
        let index = self
            .index
            .ok_or_else(|| DomainError::configuration("a corpus index is required"))?;

        let (semantic_cache, semantic_cache_config) = match self.semantic_cache {
            Some(pair) => pair,
            None => {
                let config = SemanticCacheConfig::default();
                let cache: Arc<dyn SemanticResponseCache> =
                    Arc::new(HttpSemanticCache::new(HttpClient::new(), config.clone()));
                (cache, config)
            }
        };

        Ok(RagContext {
            embedder,
            index,
            fast_cache: self.fast_cache,
            semantic_cache,
            cache_config: self.cache_config,
            semantic_cache_config,
            query_config: self.query_config,
            ingestion_config: self.ingestion_config,
            namespace: self.namespace,
        })
    }
}

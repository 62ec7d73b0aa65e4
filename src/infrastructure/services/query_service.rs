//! Query orchestration: fast cache, query embedding, corpus index

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::domain::cache::{CacheExt, CacheKeyGenerator, CacheKeyParams, CacheLookup, DefaultKeyGenerator};
use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::index::{CorpusIndex, IndexQuery, MetadataFilter};
use crate::domain::retrieval::{CacheStatus, QueryRequest, QueryResponse, QueryResult};
use crate::domain::DomainError;
use crate::infrastructure::cache::{CacheConfig, FastCacheHandle};
use crate::infrastructure::observability::{record_fast_cache_lookup, record_query};

/// Neighbours fetched from the index per requested result
const OVER_FETCH_FACTOR: usize = 2;

/// Metadata key matched by the category filter
const CATEGORY_METADATA_KEY: &str = "category";

/// Limits applied to incoming queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// `top_k` used when the caller does not give one
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    /// Larger requests are capped to this
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
}

fn default_top_k() -> usize {
    5
}

fn default_max_top_k() -> usize {
    100
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
        }
    }
}

/// Answers retrieval queries from the fast cache or the corpus index.
///
/// Cache failures never fail a query; embedding and index failures do.
#[derive(Debug)]
pub struct QueryOrchestrator {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn CorpusIndex>,
    fast_cache: Option<FastCacheHandle>,
    key_generator: DefaultKeyGenerator,
    cache_ttl: Duration,
    cache_op_timeout: Duration,
    namespace: Option<String>,
    config: QueryConfig,
}

impl QueryOrchestrator {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn CorpusIndex>) -> Self {
        let cache_config = CacheConfig::default();

        Self {
            embedder,
            index,
            fast_cache: None,
            key_generator: DefaultKeyGenerator::new(),
            cache_ttl: cache_config.ttl(),
            cache_op_timeout: cache_config.op_timeout(),
            namespace: None,
            config: QueryConfig::default(),
        }
    }

    pub fn with_fast_cache(mut self, cache: Option<FastCacheHandle>) -> Self {
        self.fast_cache = cache;
        self
    }

    /// Applies TTL, per-operation timeout and key normalization
    pub fn with_cache_config(mut self, config: &CacheConfig) -> Self {
        self.cache_ttl = config.ttl();
        self.cache_op_timeout = config.op_timeout();
        self.key_generator = DefaultKeyGenerator::new().with_normalization(config.normalization);
        self
    }

    /// Namespace queried when the request does not name one
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Returns at most `top_k` results ordered by descending similarity
    pub async fn query(
        &self,
        text: &str,
        top_k: usize,
        category: Option<&str>,
        use_cache: bool,
    ) -> Result<Vec<QueryResult>, DomainError> {
        let request = QueryRequest::new(text, top_k)
            .with_category(category.map(str::to_string))
            .with_use_cache(use_cache);

        Ok(self.query_detailed(&request).await?.results)
    }

    /// Like [`query`](Self::query) but also reports how the fast cache took part
    #[instrument(skip(self, request), fields(top_k = request.top_k, use_cache = request.use_cache))]
    pub async fn query_detailed(&self, request: &QueryRequest) -> Result<QueryResponse, DomainError> {
        let started = Instant::now();
        let top_k = self.validate(request)?;
        let namespace = request.namespace.clone().or_else(|| self.namespace.clone());
        let key = self.cache_key(request, namespace.as_deref());

        let cache = if request.use_cache {
            match self.read_cache(&key).await {
                CacheLookup::Hit(mut results) => {
                    debug!(key = %key, cached = results.len(), "Fast cache hit");
                    results.truncate(top_k);
                    record_query(CacheStatus::Hit, started.elapsed());
                    return Ok(QueryResponse {
                        results,
                        cache: CacheStatus::Hit,
                    });
                }
                CacheLookup::Miss => CacheStatus::Miss,
                CacheLookup::Unavailable => CacheStatus::Unavailable,
            }
        } else {
            CacheStatus::Bypassed
        };

        let vector = self.embedder.embed(EmbeddingRequest::query(&request.text)).await?;

        let mut index_query =
            IndexQuery::new(vector, top_k * OVER_FETCH_FACTOR).with_namespace(namespace);
        if let Some(category) = &request.category {
            index_query = index_query.with_filter(MetadataFilter::eq(CATEGORY_METADATA_KEY, category.as_str()));
        }

        let mut results: Vec<QueryResult> = self
            .index
            .query(index_query)
            .await?
            .into_iter()
            .map(QueryResult::from)
            .collect();
        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });

        if !results.is_empty() {
            self.write_cache(&key, &results).await;
        }

        results.truncate(top_k);
        debug!(results = results.len(), cache = %cache, "Answered from corpus index");
        record_query(cache, started.elapsed());

        Ok(QueryResponse { results, cache })
    }

    fn validate(&self, request: &QueryRequest) -> Result<usize, DomainError> {
        if request.text.trim().is_empty() {
            return Err(DomainError::validation("Query text cannot be empty"));
        }
        if request.top_k == 0 {
            return Err(DomainError::validation("top_k must be at least 1"));
        }
        Ok(request.top_k.min(self.config.max_top_k))
    }

    fn cache_key(&self, request: &QueryRequest, namespace: Option<&str>) -> String {
        let params = CacheKeyParams::new(&request.text)
            .with_optional_component("category", request.category.as_deref())
            .with_optional_component("namespace", namespace);

        self.key_generator.generate(&params)
    }

    async fn read_cache(&self, key: &str) -> CacheLookup<Vec<QueryResult>> {
        let Some(handle) = &self.fast_cache else {
            return CacheLookup::Unavailable;
        };

        let read = async {
            let cache = handle.get().await?;
            cache.get::<Vec<QueryResult>>(key).await
        };

        let lookup = match tokio::time::timeout(self.cache_op_timeout, read).await {
            Ok(Ok(Some(results))) => CacheLookup::Hit(results),
            Ok(Ok(None)) => CacheLookup::Miss,
            Ok(Err(e)) => {
                warn!(error = %e, "Fast cache read failed, treating as miss");
                CacheLookup::Unavailable
            }
            Err(_) => {
                warn!(timeout_ms = self.cache_op_timeout.as_millis() as u64, "Fast cache read timed out");
                CacheLookup::Unavailable
            }
        };

        record_fast_cache_lookup(lookup.outcome());
        lookup
    }

    async fn write_cache(&self, key: &str, results: &[QueryResult]) {
        let Some(handle) = &self.fast_cache else {
            return;
        };

        let write = async {
            let cache = handle.get().await?;
            cache.set(key, &results, self.cache_ttl).await
        };

        match tokio::time::timeout(self.cache_op_timeout, write).await {
            Ok(Ok(())) => debug!(key = %key, entries = results.len(), "Fast cache populated"),
            Ok(Err(e)) => warn!(error = %e, "Fast cache write failed"),
            Err(_) => warn!("Fast cache write timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{Cache, MockCache};
    use crate::domain::embedding::{EmbeddingTask, MockEmbeddingProvider};
    use crate::domain::index::{IndexMatch, Metadata, MockCorpusIndex};
    use crate::infrastructure::cache::InMemoryCache;
    use crate::infrastructure::lazy::LazyInit;
    use async_trait::async_trait;
    use serde_json::json;

    fn matches(count: usize) -> Vec<IndexMatch> {
        (0..count)
            .map(|i| {
                let mut metadata = Metadata::new();
                metadata.insert("content".into(), json!(format!("prompt {}", i)));
                metadata.insert("category".into(), json!("landscape"));
                IndexMatch::new(format!("doc-{}", i), 0.1 * i as f32, metadata)
            })
            .collect()
    }

    fn handle(cache: Arc<dyn Cache>) -> Option<FastCacheHandle> {
        Some(Arc::new(LazyInit::ready(cache)))
    }

    struct Fixture {
        embedder: Arc<MockEmbeddingProvider>,
        index: Arc<MockCorpusIndex>,
        cache: Arc<MockCache>,
        orchestrator: QueryOrchestrator,
    }

    fn fixture(index: MockCorpusIndex) -> Fixture {
        let embedder = Arc::new(MockEmbeddingProvider::new(8));
        let index = Arc::new(index);
        let cache = Arc::new(MockCache::new());
        let orchestrator = QueryOrchestrator::new(embedder.clone(), index.clone())
            .with_fast_cache(handle(cache.clone()));

        Fixture {
            embedder,
            index,
            cache,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_forest_query_on_empty_cache() {
        let f = fixture(MockCorpusIndex::new().with_matches(matches(10)));

        let response = f
            .orchestrator
            .query_detailed(&QueryRequest::new("a quiet forest at dawn", 3))
            .await
            .unwrap();

        assert_eq!(response.cache, CacheStatus::Miss);
        assert_eq!(f.embedder.call_count(), 1);
        assert_eq!(f.index.query_count(), 1);
        assert_eq!(f.index.queries()[0].top_k, 6);
        assert!(response.results.len() <= 3);
        assert!(response
            .results
            .windows(2)
            .all(|pair| pair[0].similarity >= pair[1].similarity));
    }

    #[tokio::test]
    async fn test_query_path_embeds_in_query_mode() {
        let f = fixture(MockCorpusIndex::new().with_matches(matches(2)));

        f.orchestrator.query("sunset", 1, None, true).await.unwrap();

        let calls = f.embedder.calls();
        assert_eq!(calls, vec![("sunset".to_string(), EmbeddingTask::Query)]);
        assert_eq!(
            f.index.queries()[0].vector,
            f.embedder.vector_for("sunset", EmbeddingTask::Query)
        );
    }

    #[tokio::test]
    async fn test_cache_round_trip_skips_index() {
        let f = fixture(MockCorpusIndex::new().with_matches(matches(10)));

        let first = f.orchestrator.query("misty pines", 3, None, true).await.unwrap();
        assert_eq!(f.cache.set_count(), 1);

        let response = f
            .orchestrator
            .query_detailed(&QueryRequest::new("misty pines", 2))
            .await
            .unwrap();

        assert_eq!(response.cache, CacheStatus::Hit);
        assert_eq!(f.index.query_count(), 1);
        assert_eq!(f.embedder.call_count(), 1);
        assert_eq!(response.results, first[..2].to_vec());
    }

    #[tokio::test]
    async fn test_cache_holds_over_fetched_set() {
        let f = fixture(MockCorpusIndex::new().with_matches(matches(10)));

        f.orchestrator.query("misty pines", 3, None, true).await.unwrap();

        let key = f.cache.keys().pop().unwrap();
        let cached: Vec<QueryResult> = serde_json::from_str(&f.cache.raw(&key).unwrap()).unwrap();
        assert_eq!(cached.len(), 6);
    }

    #[tokio::test]
    async fn test_hit_may_return_fewer_than_top_k() {
        let f = fixture(MockCorpusIndex::new().with_matches(matches(10)));

        f.orchestrator.query("misty pines", 1, None, true).await.unwrap();
        let results = f.orchestrator.query("misty pines", 5, None, true).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(f.index.query_count(), 1);
    }

    #[tokio::test]
    async fn test_bypass_still_writes_cache() {
        let f = fixture(MockCorpusIndex::new().with_matches(matches(4)));

        let response = f
            .orchestrator
            .query_detailed(&QueryRequest::new("harbour lights", 2).with_use_cache(false))
            .await
            .unwrap();

        assert_eq!(response.cache, CacheStatus::Bypassed);
        assert_eq!(f.cache.get_count(), 0);
        assert_eq!(f.cache.set_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_results_are_not_cached() {
        let f = fixture(MockCorpusIndex::new());

        let results = f.orchestrator.query("nothing here", 3, None, true).await.unwrap();

        assert!(results.is_empty());
        assert_eq!(f.cache.set_count(), 0);
    }

    #[tokio::test]
    async fn test_category_becomes_filter_and_key_component() {
        let f = fixture(MockCorpusIndex::new().with_matches(matches(2)));

        f.orchestrator.query("portrait", 1, Some("ads"), true).await.unwrap();
        f.orchestrator.query("portrait", 1, None, true).await.unwrap();

        let filter = f.index.queries()[0].filter.clone().unwrap();
        let predicates: Vec<_> = filter.predicates().collect();
        assert_eq!(predicates, vec![(&"category".to_string(), &json!("ads"))]);
        assert!(f.index.queries()[1].filter.is_none());
        assert_eq!(f.cache.keys().len(), 2);
    }

    #[tokio::test]
    async fn test_request_namespace_overrides_default() {
        let embedder = Arc::new(MockEmbeddingProvider::new(8));
        let index = Arc::new(MockCorpusIndex::new().with_matches(matches(1)));
        let orchestrator = QueryOrchestrator::new(embedder, index.clone())
            .with_namespace(Some("system-prompts".into()));

        orchestrator
            .query_detailed(&QueryRequest::new("q", 1))
            .await
            .unwrap();
        orchestrator
            .query_detailed(&QueryRequest::new("q", 1).with_namespace(Some("video-prompts".into())))
            .await
            .unwrap();

        let queries = index.queries();
        assert_eq!(queries[0].namespace.as_deref(), Some("system-prompts"));
        assert_eq!(queries[1].namespace.as_deref(), Some("video-prompts"));
    }

    #[tokio::test]
    async fn test_cache_errors_degrade_to_miss() {
        let embedder = Arc::new(MockEmbeddingProvider::new(8));
        let index = Arc::new(MockCorpusIndex::new().with_matches(matches(3)));
        let cache: Arc<dyn Cache> = Arc::new(MockCache::new().with_error("connection refused"));
        let orchestrator = QueryOrchestrator::new(embedder, index).with_fast_cache(handle(cache));

        let response = orchestrator
            .query_detailed(&QueryRequest::new("q", 2))
            .await
            .unwrap();

        assert_eq!(response.cache, CacheStatus::Unavailable);
        assert_eq!(response.results.len(), 2);
    }

    #[tokio::test]
    async fn test_without_fast_cache() {
        let embedder = Arc::new(MockEmbeddingProvider::new(8));
        let index = Arc::new(MockCorpusIndex::new().with_matches(matches(3)));
        let orchestrator = QueryOrchestrator::new(embedder, index);

        let response = orchestrator
            .query_detailed(&QueryRequest::new("q", 2))
            .await
            .unwrap();

        assert_eq!(response.cache, CacheStatus::Unavailable);
        assert_eq!(response.results.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_cache_connection_degrades_to_miss() {
        let embedder = Arc::new(MockEmbeddingProvider::new(8));
        let index = Arc::new(MockCorpusIndex::new().with_matches(matches(3)));
        let lazy = LazyInit::new(|| async {
            Err::<Arc<dyn Cache>, _>(DomainError::cache("connection refused"))
        });
        let orchestrator =
            QueryOrchestrator::new(embedder, index).with_fast_cache(Some(Arc::new(lazy)));

        let results = orchestrator.query("q", 2, None, true).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[derive(Debug)]
    struct StalledCache;

    #[async_trait]
    impl Cache for StalledCache {
        async fn get_raw(&self, _key: &str) -> Result<Option<String>, DomainError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        }

        async fn set_raw(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), DomainError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }

        async fn size(&self) -> Result<usize, DomainError> {
            Ok(0)
        }

        fn backend_name(&self) -> &'static str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn test_stalled_cache_times_out_as_miss() {
        let embedder = Arc::new(MockEmbeddingProvider::new(8));
        let index = Arc::new(MockCorpusIndex::new().with_matches(matches(3)));
        let config = CacheConfig::default().with_op_timeout(Duration::from_millis(20));
        let orchestrator = QueryOrchestrator::new(embedder, index)
            .with_fast_cache(handle(Arc::new(StalledCache)))
            .with_cache_config(&config);

        let started = Instant::now();
        let response = orchestrator
            .query_detailed(&QueryRequest::new("q", 2))
            .await
            .unwrap();

        assert_eq!(response.cache, CacheStatus::Unavailable);
        assert_eq!(response.results.len(), 2);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_real_in_memory_cache_expires() {
        let embedder = Arc::new(MockEmbeddingProvider::new(8));
        let index = Arc::new(MockCorpusIndex::new().with_matches(matches(3)));
        let config = CacheConfig::in_memory().with_ttl(Duration::from_millis(50));
        let orchestrator = QueryOrchestrator::new(embedder, index.clone())
            .with_fast_cache(handle(Arc::new(InMemoryCache::new())))
            .with_cache_config(&config);

        orchestrator.query("dunes", 1, None, true).await.unwrap();
        orchestrator.query("dunes", 1, None, true).await.unwrap();
        assert_eq!(index.query_count(), 1);

        tokio::time::sleep(Duration::from_millis(80)).await;
        orchestrator.query("dunes", 1, None, true).await.unwrap();
        assert_eq!(index.query_count(), 2);
    }

    #[tokio::test]
    async fn test_validation() {
        let f = fixture(MockCorpusIndex::new());

        let empty = f.orchestrator.query("   ", 3, None, true).await;
        assert!(matches!(empty, Err(DomainError::Validation { .. })));

        let zero = f.orchestrator.query("q", 0, None, true).await;
        assert!(matches!(zero, Err(DomainError::Validation { .. })));

        assert_eq!(f.embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_top_k_is_capped() {
        let f = fixture(MockCorpusIndex::new());

        f.orchestrator.query("q", 500, None, false).await.unwrap();

        assert_eq!(f.index.queries()[0].top_k, 200);
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let embedder = Arc::new(MockEmbeddingProvider::new(8).with_error("quota exhausted"));
        let index = Arc::new(MockCorpusIndex::new());
        let orchestrator = QueryOrchestrator::new(embedder, index.clone());

        let result = orchestrator.query("q", 3, None, true).await;

        assert!(matches!(result, Err(DomainError::Embedding { .. })));
        assert_eq!(index.query_count(), 0);
    }

    #[tokio::test]
    async fn test_index_failure_propagates() {
        let f = fixture(MockCorpusIndex::new().failing_queries());

        let result = f.orchestrator.query("q", 3, None, true).await;

        assert!(matches!(result, Err(DomainError::Index { .. })));
        assert_eq!(f.cache.set_count(), 0);
    }

    #[test]
    fn test_query_config_defaults() {
        let config: QueryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.default_top_k, 5);
        assert_eq!(config.max_top_k, 100);
    }
}

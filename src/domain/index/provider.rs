//! Corpus index provider trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::{IndexMatch, IndexStats, MetadataFilter, VectorRecord};
use crate::domain::error::DomainError;

/// Nearest-neighbour query parameters
#[derive(Debug, Clone, Default)]
pub struct IndexQuery {
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub filter: Option<MetadataFilter>,
    /// Target namespace; `None` is the index default namespace
    pub namespace: Option<String>,
}

impl IndexQuery {
    pub fn new(vector: Vec<f32>, top_k: usize) -> Self {
        Self {
            vector,
            top_k,
            filter: None,
            namespace: None,
        }
    }

    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }
}

/// Persistent similarity-search store of `(id, vector, metadata)` records.
///
/// Namespaces isolate collections: a query only sees records upserted into the
/// same namespace.
#[async_trait]
pub trait CorpusIndex: Send + Sync + Debug {
    /// Get the backend name
    fn backend_name(&self) -> &'static str;

    /// Largest number of records a single `upsert` call writes in one request.
    ///
    /// Callers that must know which records were stored split their writes to
    /// this size.
    fn max_upsert_batch(&self) -> usize {
        usize::MAX
    }

    /// Inserts or replaces records by id, returning the number written
    async fn upsert(
        &self,
        namespace: Option<&str>,
        records: Vec<VectorRecord>,
    ) -> Result<usize, DomainError>;

    /// Returns up to `top_k` matches ordered by ascending distance
    async fn query(&self, query: IndexQuery) -> Result<Vec<IndexMatch>, DomainError>;

    /// Describes the index contents
    async fn stats(&self) -> Result<IndexStats, DomainError>;
}

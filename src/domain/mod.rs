//! Domain layer - Core retrieval types and the traits external stores implement

pub mod cache;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingestion;
pub mod retrieval;
pub mod semantic_cache;

pub use cache::{
    Cache, CacheExt, CacheKeyGenerator, CacheKeyParams, CacheLookup, DefaultKeyGenerator,
    KeyNormalization,
};
pub use embedding::{EmbeddingProvider, EmbeddingRequest, EmbeddingTask};
pub use error::DomainError;
pub use index::{CorpusIndex, IndexMatch, IndexQuery, IndexStats, Metadata, MetadataFilter, VectorRecord};
pub use ingestion::{AbortReason, DocumentError, HotCacheEntry, IngestionConfig, IngestionReport};
pub use retrieval::{
    CacheStatus, NewDocument, QueryRequest, QueryResponse, QueryResult, CONTENT_METADATA_KEY,
};
pub use semantic_cache::{SemanticCacheConfig, SemanticCacheEntry, SemanticResponseCache};

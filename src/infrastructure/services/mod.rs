//! Infrastructure services

mod ingestion_service;
mod query_service;
mod semantic_cache_service;
mod stats_service;

pub use ingestion_service::IngestionPipeline;
pub use query_service::{QueryConfig, QueryOrchestrator};
pub use semantic_cache_service::SemanticCacheService;
pub use stats_service::{
    EmbeddingStatus, FastCacheStatus, IndexStatus, StatsReport, StatsService,
};

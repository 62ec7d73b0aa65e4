//! Observability infrastructure - Prometheus metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    init_metrics, record_fast_cache_lookup, record_hot_cache_writes, record_index_upsert,
    record_ingested_documents, record_ingestion_error, record_query,
    record_semantic_cache_lookup,
};

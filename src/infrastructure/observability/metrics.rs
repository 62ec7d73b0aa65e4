//! Prometheus metrics infrastructure

use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use super::config::MetricsConfig;
use crate::domain::CacheStatus;
use crate::domain::DomainError;

/// Installs the Prometheus recorder with an HTTP scrape listener.
///
/// Returns `Ok(false)` when metrics are disabled. Without a recorder the
/// `record_*` helpers are no-ops.
pub fn init_metrics(config: &MetricsConfig) -> Result<bool, DomainError> {
    if !config.enabled {
        tracing::debug!("Prometheus metrics disabled");
        return Ok(false);
    }

    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .install()
        .map_err(|e| {
            DomainError::configuration(format!("Failed to install Prometheus exporter: {}", e))
        })?;

    gauge!("rag_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    tracing::info!(addr = %config.listen_addr, "Prometheus metrics listening");

    Ok(true)
}

/// Record a completed query
pub fn record_query(cache: CacheStatus, duration: Duration) {
    counter!("rag_queries_total", "cache" => cache.as_str()).increment(1);
    histogram!("rag_query_duration_seconds", "cache" => cache.as_str())
        .record(duration.as_secs_f64());
}

/// Record a fast cache read outcome (`hit`, `miss`, `unavailable`)
pub fn record_fast_cache_lookup(outcome: &'static str) {
    counter!("rag_fast_cache_lookups_total", "outcome" => outcome).increment(1);
}

/// Record a semantic cache read outcome (`hit`, `miss`, `unavailable`)
pub fn record_semantic_cache_lookup(outcome: &'static str) {
    counter!("rag_semantic_cache_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_ingested_documents(count: usize) {
    counter!("rag_ingested_documents_total").increment(count as u64);
}

pub fn record_ingestion_error() {
    counter!("rag_ingestion_errors_total").increment(1);
}

/// Record fast cache copies made during ingestion
pub fn record_hot_cache_writes(stored: usize, failed: usize) {
    counter!("rag_hot_cache_writes_total", "outcome" => "stored").increment(stored as u64);
    counter!("rag_hot_cache_writes_total", "outcome" => "failed").increment(failed as u64);
}

pub fn record_index_upsert(count: usize) {
    counter!("rag_index_upserts_total").increment(1);
    histogram!("rag_index_upsert_size").record(count as f64);
}

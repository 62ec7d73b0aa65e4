//! Ingestion pipeline types and configuration

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_batch_size, validate_content_limit};
use crate::domain::index::{Metadata, VectorRecord};
use crate::domain::retrieval::CONTENT_METADATA_KEY;
use crate::domain::DomainError;

/// Configuration for document ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Records buffered before each upsert
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Fixed pause between embedding calls
    #[serde(default = "default_embed_delay_ms")]
    pub embed_delay_ms: u64,
    /// Per-document failures tolerated before the run is aborted
    #[serde(default = "default_error_budget")]
    pub error_budget: usize,
    /// Characters of content mirrored into metadata
    #[serde(default = "default_content_limit")]
    pub content_limit: usize,
    /// Target index namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Mirror every stored record into the fast cache under `hot:{id}`
    #[serde(default)]
    pub hot_cache: bool,
    #[serde(default = "default_hot_cache_ttl_secs")]
    pub hot_cache_ttl_secs: u64,
}

fn default_batch_size() -> usize {
    50
}

fn default_embed_delay_ms() -> u64 {
    50
}

fn default_error_budget() -> usize {
    10
}

fn default_content_limit() -> usize {
    1000
}

fn default_hot_cache_ttl_secs() -> u64 {
    86_400
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            embed_delay_ms: default_embed_delay_ms(),
            error_budget: default_error_budget(),
            content_limit: default_content_limit(),
            namespace: None,
            hot_cache: false,
            hot_cache_ttl_secs: default_hot_cache_ttl_secs(),
        }
    }
}

impl IngestionConfig {
    /// Create a new ingestion configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the pause between embedding calls
    pub fn with_embed_delay(mut self, delay: Duration) -> Self {
        self.embed_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_error_budget(mut self, error_budget: usize) -> Self {
        self.error_budget = error_budget;
        self
    }

    pub fn with_content_limit(mut self, content_limit: usize) -> Self {
        self.content_limit = content_limit;
        self
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_hot_cache(mut self, enabled: bool) -> Self {
        self.hot_cache = enabled;
        self
    }

    pub fn embed_delay(&self) -> Duration {
        Duration::from_millis(self.embed_delay_ms)
    }

    pub fn hot_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.hot_cache_ttl_secs)
    }

    /// Checks the tunables are within their accepted ranges
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_batch_size(self.batch_size)?;
        validate_content_limit(self.content_limit)
    }
}

/// Fast cache copy of a stored record, kept for direct lookup by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotCacheEntry {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
}

impl HotCacheEntry {
    /// Fast cache key of the record `id`
    pub fn key(id: &str) -> String {
        format!("hot:{}", id)
    }

    /// Splits the content mirrored into the record metadata back out
    pub fn from_record(record: &VectorRecord) -> Self {
        let mut metadata = record.metadata.clone();
        let content = match metadata.remove(CONTENT_METADATA_KEY) {
            Some(serde_json::Value::String(content)) => content,
            _ => String::new(),
        };

        Self {
            id: record.id.clone(),
            content,
            metadata,
        }
    }
}

/// A document that was skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentError {
    /// Position of the document in the input
    pub index: usize,
    pub message: String,
}

impl DocumentError {
    pub fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }
}

/// Why a run stopped before the end of its input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum AbortReason {
    ErrorBudgetExceeded,
    IndexFailure(String),
    Cancelled,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ErrorBudgetExceeded => write!(f, "error budget exceeded"),
            Self::IndexFailure(message) => write!(f, "index failure: {}", message),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Outcome of an ingestion run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionReport {
    /// Ids of the documents embedded and flushed to the index
    pub ids: Vec<String>,
    pub error_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<DocumentError>,
    /// Size of each successful upsert, in order
    pub upserts: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<AbortReason>,
    /// Records also written to the fast cache
    #[serde(default)]
    pub hot_cached: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl IngestionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty report stamped with the current time
    pub fn started() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration of a finished run
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }

    /// Number of documents stored
    pub fn ingested(&self) -> usize {
        self.ids.len()
    }

    /// Whether the whole input was processed
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }

    pub fn record_error(&mut self, error: DocumentError) {
        self.error_count += 1;
        self.errors.push(error);
    }

    pub fn record_flush(&mut self, ids: Vec<String>) {
        self.upserts.push(ids.len());
        self.ids.extend(ids);
    }
}

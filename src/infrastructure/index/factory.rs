//! Corpus index factory for runtime selection

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::in_memory::InMemoryCorpusIndex;
use super::pinecone::{PineconeConfig, PineconeIndex};
use crate::domain::index::CorpusIndex;
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClient;

/// Supported corpus index backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBackend {
    #[default]
    Pinecone,
    InMemory,
}

impl std::fmt::Display for IndexBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexBackend::Pinecone => write!(f, "pinecone"),
            IndexBackend::InMemory => write!(f, "in_memory"),
        }
    }
}

/// Corpus index settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub backend: IndexBackend,
    /// Namespace used when a request does not name one
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub pinecone: PineconeConfig,
}

impl IndexConfig {
    pub fn in_memory() -> Self {
        Self {
            backend: IndexBackend::InMemory,
            ..Default::default()
        }
    }
}

/// Factory for creating corpus index instances
#[derive(Debug, Default)]
pub struct IndexFactory;

impl IndexFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates the configured index; `dimension` is only used by the in-memory backend
    pub fn create(
        &self,
        config: &IndexConfig,
        dimension: usize,
    ) -> Result<Arc<dyn CorpusIndex>, DomainError> {
        match config.backend {
            IndexBackend::InMemory => {
                info!(dimension, "Using in-memory corpus index");
                Ok(Arc::new(InMemoryCorpusIndex::new(dimension)))
            }
            IndexBackend::Pinecone => {
                let client = HttpClient::with_timeout(config.pinecone.timeout())?;
                info!(
                    index = config.pinecone.index_name.as_deref().unwrap_or("<unnamed>"),
                    "Using Pinecone corpus index"
                );
                Ok(Arc::new(PineconeIndex::new(client, config.pinecone.clone())))
            }
        }
    }
}

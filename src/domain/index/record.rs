//! Records stored in and returned from the corpus index

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Document metadata as stored next to each vector
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A vector with its id and metadata, as upserted into the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl VectorRecord {
    pub fn new(id: impl Into<String>, values: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            values,
            metadata,
        }
    }
}

/// A nearest-neighbour hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    /// Cosine distance to the query vector; smaller is closer
    pub distance: f32,
    #[serde(default)]
    pub metadata: Metadata,
}

impl IndexMatch {
    pub fn new(id: impl Into<String>, distance: f32, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            distance,
            metadata,
        }
    }
}

/// Index-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_vector_count: u64,
    pub dimension: Option<usize>,
    /// Vector count per namespace; the default namespace is keyed by `""`
    pub namespaces: BTreeMap<String, u64>,
}

impl IndexStats {
    pub fn namespace_count(&self, namespace: &str) -> u64 {
        self.namespaces.get(namespace).copied().unwrap_or(0)
    }
}

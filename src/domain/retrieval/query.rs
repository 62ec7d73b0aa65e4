//! Query request and result types

use std::fmt;

use serde::{Deserialize, Serialize};

use super::CONTENT_METADATA_KEY;
use crate::domain::embedding::distance_to_similarity;
use crate::domain::index::{IndexMatch, Metadata};

/// A ranked retrieval hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: String,
    pub content: String,
    /// In `[0, 1]`, higher is closer
    pub similarity: f32,
    /// Document metadata without the reserved `content` key
    pub metadata: Metadata,
}

impl From<IndexMatch> for QueryResult {
    fn from(matched: IndexMatch) -> Self {
        let mut metadata = matched.metadata;
        let content = match metadata.remove(CONTENT_METADATA_KEY) {
            Some(serde_json::Value::String(content)) => content,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        Self {
            id: matched.id,
            content,
            similarity: distance_to_similarity(matched.distance),
            metadata,
        }
    }
}

/// Parameters of a retrieval query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub text: String,
    pub top_k: usize,
    #[serde(default)]
    pub category: Option<String>,
    /// Overrides the configured index namespace
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

fn default_use_cache() -> bool {
    true
}

impl QueryRequest {
    pub fn new(text: impl Into<String>, top_k: usize) -> Self {
        Self {
            text: text.into(),
            top_k,
            category: None,
            namespace: None,
            use_cache: true,
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }
}

/// How the fast cache took part in answering a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    Hit,
    Miss,
    /// Cache not configured, unreachable or timed out
    Unavailable,
    /// Caller asked to skip the cache read
    Bypassed,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Unavailable => "unavailable",
            Self::Bypassed => "bypassed",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Results plus the cache path that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<QueryResult>,
    pub cache: CacheStatus,
}

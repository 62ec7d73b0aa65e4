//! Embedding request types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which side of retrieval a text is embedded for.
///
/// Providers may return different vectors for the same text depending on the
/// task, so documents and queries must never be mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingTask {
    /// Text being stored in the corpus
    Document,
    /// Text being searched with
    Query,
}

impl fmt::Display for EmbeddingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// Request to embed a single text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    text: String,
    task: EmbeddingTask,
}

impl EmbeddingRequest {
    /// Create a new embedding request
    pub fn new(text: impl Into<String>, task: EmbeddingTask) -> Self {
        Self {
            text: text.into(),
            task,
        }
    }

    /// Create a request for a document being ingested
    pub fn document(text: impl Into<String>) -> Self {
        Self::new(text, EmbeddingTask::Document)
    }

    /// Create a request for a search query
    pub fn query(text: impl Into<String>) -> Self {
        Self::new(text, EmbeddingTask::Query)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn task(&self) -> EmbeddingTask {
        self.task
    }
}

//! Documents submitted for ingestion

use serde::{Deserialize, Serialize};

use crate::domain::index::Metadata;

/// Reserved metadata key holding the (truncated) document text
pub const CONTENT_METADATA_KEY: &str = "content";

/// A document before it has an id or an embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_all_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Builds the metadata stored in the index: caller metadata plus the
    /// truncated content under the reserved key.
    pub fn index_metadata(&self, content_limit: usize) -> Metadata {
        let mut metadata = self.metadata.clone();
        metadata.insert(
            CONTENT_METADATA_KEY.to_string(),
            serde_json::Value::String(truncate_content(&self.content, content_limit).to_string()),
        );
        metadata
    }
}

/// Truncates to at most `limit` characters without splitting one
pub fn truncate_content(content: &str, limit: usize) -> &str {
    match content.char_indices().nth(limit) {
        Some((byte_idx, _)) => &content[..byte_idx],
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_shorter_than_limit() {
        assert_eq!(truncate_content("short", 1000), "short");
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate_content("héllo wörld", 5), "héllo");
        assert_eq!(truncate_content("日本語テキスト", 3), "日本語");
    }

    #[test]
    fn test_truncate_zero_limit() {
        assert_eq!(truncate_content("anything", 0), "");
    }

    #[test]
    fn test_index_metadata_overrides_content_key() {
        let document = NewDocument::new("a".repeat(1500))
            .with_metadata("category", "landscape")
            .with_metadata("content", "caller supplied");

        let metadata = document.index_metadata(1000);

        assert_eq!(metadata["category"], json!("landscape"));
        assert_eq!(metadata["content"].as_str().unwrap().chars().count(), 1000);
    }

    #[test]
    fn test_deserialize_without_metadata() {
        let document: NewDocument = serde_json::from_str(r#"{"content": "x"}"#).unwrap();
        assert!(document.metadata.is_empty());
    }
}

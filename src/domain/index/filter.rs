//! Metadata filtering for index queries

use std::collections::BTreeMap;

use serde_json::Value;

use super::Metadata;

/// Conjunction of equality predicates on metadata keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    equals: BTreeMap<String, Value>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single equality predicate
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and_eq(key, value)
    }

    /// Adds an equality predicate
    pub fn and_eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.insert(key.into(), value.into());
        self
    }

    pub fn predicates(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.equals.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }

    /// Whether a metadata map satisfies every predicate
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.equals
            .iter()
            .all(|(key, expected)| metadata.get(key) == Some(expected))
    }
}

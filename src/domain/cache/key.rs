//! Cache key generation strategies

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Trait for generating cache keys from input data
pub trait CacheKeyGenerator: Send + Sync + Debug {
    /// Generates a cache key from the given components
    fn generate(&self, params: &CacheKeyParams) -> String;
}

/// How query text is normalized before it is hashed into a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyNormalization {
    /// Raw text, byte for byte
    #[default]
    Exact,
    /// Lowercased, with runs of whitespace collapsed and ends trimmed
    CaseAndWhitespace,
}

impl KeyNormalization {
    /// Applies the normalization to the given text
    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::Exact => text.to_string(),
            Self::CaseAndWhitespace => text
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase(),
        }
    }
}

/// Parameters for cache key generation
#[derive(Debug, Clone, Default)]
pub struct CacheKeyParams {
    /// Primary identifier (the query text)
    pub primary: String,
    /// Secondary components (sorted for consistency)
    pub components: BTreeMap<String, String>,
}

impl CacheKeyParams {
    /// Creates new cache key parameters with a primary identifier
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            components: BTreeMap::new(),
        }
    }

    /// Adds a component to the key parameters
    pub fn with_component(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.components.insert(key.into(), value.into());
        self
    }

    /// Adds a component only when a value is present
    pub fn with_optional_component(self, key: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with_component(key, value),
            None => self,
        }
    }
}

/// Default cache key generator producing SHA-256 hex digests.
///
/// Keys must be stable across processes since they land in a shared Redis.
#[derive(Debug, Clone, Default)]
pub struct DefaultKeyGenerator {
    normalization: KeyNormalization,
}

impl DefaultKeyGenerator {
    /// Creates a new default key generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the normalization applied to the primary component
    pub fn with_normalization(mut self, normalization: KeyNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    fn hash_string(input: &str) -> String {
        hex::encode(Sha256::digest(input.as_bytes()))
    }
}

impl CacheKeyGenerator for DefaultKeyGenerator {
    fn generate(&self, params: &CacheKeyParams) -> String {
        let mut parts = vec![self.normalization.apply(&params.primary)];

        for (k, v) in &params.components {
            parts.push(format!("{}={}", k, v));
        }

        // Unit separator cannot appear in the joined parts by accident
        Self::hash_string(&parts.join("\u{1f}"))
    }
}

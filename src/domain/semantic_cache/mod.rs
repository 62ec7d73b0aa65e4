//! Semantic response cache domain models and traits
//!
//! A threshold-gated cache of generated responses, keyed by prompt meaning
//! rather than exact text.

mod config;
mod repository;

pub use config::{clamp_threshold, SemanticCacheConfig};
pub use repository::{SemanticCacheEntry, SemanticResponseCache};

#[cfg(test)]
pub use repository::MockSemanticResponseCache;

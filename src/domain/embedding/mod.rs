//! Embedding provider domain models and traits

mod provider;
mod request;
mod similarity;

pub use provider::{check_dimensions, EmbeddingProvider};
pub use request::{EmbeddingRequest, EmbeddingTask};
pub use similarity::{cosine_distance, cosine_similarity, distance_to_similarity};

#[cfg(test)]
pub use provider::mock::MockEmbeddingProvider;

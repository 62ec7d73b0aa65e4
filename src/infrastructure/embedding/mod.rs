//! Embedding provider implementations

mod gemini;

pub use gemini::{GeminiEmbeddingConfig, GeminiEmbeddingProvider};

//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::EmbeddingRequest;
use crate::domain::DomainError;

/// Trait for embedding providers (Gemini, test doubles)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Embed one text, returning a vector of exactly `dimensions()` floats
    async fn embed(&self, request: EmbeddingRequest) -> Result<Vec<f32>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Get the model this provider embeds with
    fn model(&self) -> &str;

    /// Get the configured output dimensionality
    fn dimensions(&self) -> usize;
}

/// Checks a provider output against the declared dimensionality
pub fn check_dimensions(
    provider: &str,
    vector: Vec<f32>,
    expected: usize,
) -> Result<Vec<f32>, DomainError> {
    if vector.len() != expected {
        return Err(DomainError::embedding(
            provider,
            format!(
                "expected a {}-dimensional vector, got {}",
                expected,
                vector.len()
            ),
        ));
    }
    Ok(vector)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dimensions() {
        assert!(check_dimensions("gemini", vec![0.0; 4], 4).is_ok());

        let err = check_dimensions("gemini", vec![0.0; 3], 4).unwrap_err();
        assert!(matches!(err, DomainError::Embedding { .. }));
    }
}

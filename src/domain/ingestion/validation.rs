//! Validation helpers for ingestion

use crate::domain::DomainError;

/// Largest number of characters of content mirrored into metadata
pub const MAX_CONTENT_LIMIT: usize = 8000;

/// Validate batch size
pub fn validate_batch_size(batch_size: usize) -> Result<(), DomainError> {
    if batch_size == 0 {
        return Err(DomainError::validation("Batch size must be greater than 0"));
    }

    if batch_size > 1000 {
        return Err(DomainError::validation("Batch size cannot exceed 1000"));
    }

    Ok(())
}

/// Validate the metadata content limit
pub fn validate_content_limit(content_limit: usize) -> Result<(), DomainError> {
    if content_limit == 0 {
        return Err(DomainError::validation(
            "Content limit must be greater than 0",
        ));
    }

    if content_limit > MAX_CONTENT_LIMIT {
        return Err(DomainError::validation(format!(
            "Content limit cannot exceed {} characters",
            MAX_CONTENT_LIMIT
        )));
    }

    Ok(())
}

/// Validate document content before it is embedded
pub fn validate_content(content: &str) -> Result<(), DomainError> {
    if content.trim().is_empty() {
        return Err(DomainError::validation("Document content cannot be empty"));
    }

    Ok(())
}

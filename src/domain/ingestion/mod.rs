//! Document ingestion domain types
//!
//! Configuration, per-document errors and the run report of the ingestion
//! pipeline.

pub mod pipeline;
pub mod validation;

pub use pipeline::{AbortReason, DocumentError, HotCacheEntry, IngestionConfig, IngestionReport};
pub use validation::{
    validate_batch_size, validate_content, validate_content_limit, MAX_CONTENT_LIMIT,
};

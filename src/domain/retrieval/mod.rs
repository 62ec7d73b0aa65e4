//! Retrieval domain - query and document types shared by the services

mod document;
mod query;

pub use document::{truncate_content, NewDocument, CONTENT_METADATA_KEY};
pub use query::{CacheStatus, QueryRequest, QueryResponse, QueryResult};

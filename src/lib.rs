//! Hybrid retrieval and caching core
//!
//! Answers similarity queries over a prompt corpus with:
//! - A fast exact-match result cache (in-memory or Redis)
//! - A persistent vector index (Pinecone or in-memory)
//! - Paced, error-budgeted batch ingestion
//! - A client for an external semantic response cache

pub mod cli;
pub mod config;
pub mod context;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use context::{RagContext, RagContextBuilder};

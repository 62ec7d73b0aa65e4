//! Infrastructure layer - External service implementations

pub mod cache;
pub mod embedding;
pub mod http_client;
pub mod index;
pub mod lazy;
pub mod logging;
pub mod observability;
pub mod semantic_cache;
pub mod services;

//! Semantic response cache implementations

mod http;

pub use http::HttpSemanticCache;

//! Corpus index implementations

mod factory;
mod in_memory;
mod pinecone;

pub use factory::{IndexBackend, IndexConfig, IndexFactory};
pub use in_memory::InMemoryCorpusIndex;
pub use pinecone::{PineconeConfig, PineconeIndex};

//! Corpus index domain - persistent vector store abstraction

mod filter;
mod provider;
mod record;

pub use filter::MetadataFilter;
pub use provider::{CorpusIndex, IndexQuery};
pub use record::{IndexMatch, IndexStats, Metadata, VectorRecord};

#[cfg(test)]
pub use provider::mock::MockCorpusIndex;

//! Cache domain - Generic caching abstraction layer

mod key;
mod lookup;
mod repository;

pub use key::{CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator, KeyNormalization};
pub use lookup::CacheLookup;
pub use repository::{Cache, CacheExt};

#[cfg(test)]
pub use repository::mock::MockCache;

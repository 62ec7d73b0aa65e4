//! Cache infrastructure - Fast cache implementations

mod factory;
mod in_memory;
mod redis;

use std::sync::Arc;

pub use factory::{CacheConfig, CacheFactory, CacheType};
pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use redis::{redis_ttl_secs, RedisCache, RedisCacheConfig};

use crate::domain::Cache;
use crate::infrastructure::lazy::LazyInit;

/// Fast cache connected on first use and shared between services
pub type FastCacheHandle = Arc<LazyInit<Arc<dyn Cache>>>;

/// Builds a handle that connects the configured backend on first use.
///
/// Returns `None` when the cache is disabled.
pub fn lazy_fast_cache(config: &CacheConfig) -> Option<FastCacheHandle> {
    if config.backend == CacheType::Disabled {
        return None;
    }

    let config = config.clone();
    Some(Arc::new(LazyInit::new(move || {
        let config = config.clone();
        async move {
            CacheFactory::new()
                .create(&config)
                .await?
                .ok_or_else(|| crate::domain::DomainError::configuration("fast cache is disabled"))
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_fast_cache_disabled() {
        assert!(lazy_fast_cache(&CacheConfig::disabled()).is_none());
    }

    #[tokio::test]
    async fn test_lazy_fast_cache_connects_on_first_use() {
        let handle = lazy_fast_cache(&CacheConfig::in_memory()).unwrap();
        assert!(!handle.is_initialized());

        let cache = handle.get().await.unwrap();
        assert_eq!(cache.backend_name(), "in_memory");
        assert!(handle.is_initialized());
    }

    #[tokio::test]
    async fn test_lazy_redis_without_url_is_configuration_error() {
        let mut config = CacheConfig::default();
        config.backend = CacheType::Redis;
        config.redis_url = None;

        let handle = lazy_fast_cache(&config).unwrap();
        assert!(handle.get().await.unwrap_err().is_configuration());
    }
}

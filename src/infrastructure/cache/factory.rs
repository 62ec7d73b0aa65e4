//! Cache factory for runtime selection

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::cache::{Cache, KeyNormalization};
use crate::domain::DomainError;

use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::redis::{RedisCache, RedisCacheConfig};

/// Supported cache types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    /// In-memory cache using moka
    #[default]
    InMemory,
    /// Redis cache
    Redis,
    /// No fast cache; every query goes to the index
    Disabled,
}

impl std::fmt::Display for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheType::InMemory => write!(f, "in_memory"),
            CacheType::Redis => write!(f, "redis"),
            CacheType::Disabled => write!(f, "disabled"),
        }
    }
}

impl std::str::FromStr for CacheType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheType::InMemory),
            "redis" => Ok(CacheType::Redis),
            "disabled" | "none" | "off" => Ok(CacheType::Disabled),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache type: {}. Valid types: in_memory, redis, disabled",
                s
            ))),
        }
    }
}

/// Fast cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Type of cache to create
    #[serde(default)]
    pub backend: CacheType,
    /// Redis URL (required for Redis type)
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Prefix of every key written to a shared store
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Lifetime of cached result sets
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Maximum capacity (for in-memory cache)
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// Budget for a single read or write before it counts as a miss
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Query text normalization applied before hashing
    #[serde(default)]
    pub normalization: KeyNormalization,
}

fn default_key_prefix() -> String {
    "rag:cache".to_string()
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_max_capacity() -> u64 {
    10_000
}

fn default_op_timeout_ms() -> u64 {
    500
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheType::InMemory,
            redis_url: None,
            key_prefix: default_key_prefix(),
            ttl_secs: default_ttl_secs(),
            max_capacity: default_max_capacity(),
            op_timeout_ms: default_op_timeout_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            normalization: KeyNormalization::default(),
        }
    }
}

impl CacheConfig {
    /// Creates a new configuration for in-memory cache
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a new configuration for Redis cache
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: CacheType::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: CacheType::Disabled,
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the entry TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }

    /// Sets the maximum capacity (in-memory only)
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_normalization(mut self, normalization: KeyNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

/// Factory for creating cache instances
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    /// Creates a new cache factory
    pub fn new() -> Self {
        Self
    }

    /// Creates a cache instance based on configuration; `None` when disabled
    pub async fn create(&self, config: &CacheConfig) -> Result<Option<Arc<dyn Cache>>, DomainError> {
        match config.backend {
            CacheType::Disabled => {
                info!("Fast cache disabled");
                Ok(None)
            }
            CacheType::InMemory => {
                let in_memory_config =
                    InMemoryCacheConfig::default().with_max_capacity(config.max_capacity);

                info!(max_capacity = config.max_capacity, "Using in-memory fast cache");
                Ok(Some(Arc::new(InMemoryCache::with_config(in_memory_config))))
            }
            CacheType::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for Redis cache type")
                })?;

                let redis_config = RedisCacheConfig::new(url)
                    .with_key_prefix(config.key_prefix.clone())
                    .with_connection_timeout(Duration::from_secs(config.connect_timeout_secs));

                let cache = RedisCache::new(redis_config).await?;
                info!(prefix = %config.key_prefix, "Connected Redis fast cache");
                Ok(Some(Arc::new(cache)))
            }
        }
    }
}

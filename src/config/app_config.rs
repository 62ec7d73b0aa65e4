use serde::Deserialize;

use crate::domain::IngestionConfig;
use crate::domain::SemanticCacheConfig;
use crate::infrastructure::cache::CacheConfig;
use crate::infrastructure::embedding::GeminiEmbeddingConfig;
use crate::infrastructure::index::IndexConfig;
use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::services::QueryConfig;

/// Environment variables honoured as-is, with the setting each one fills
const WELL_KNOWN_ENV: &[(&str, &str)] = &[
    ("GOOGLE_API_KEY", "embedding.api_key"),
    ("PINECONE_API_KEY", "index.pinecone.api_key"),
    ("PINECONE_HOST", "index.pinecone.host"),
    ("PINECONE_INDEX_NAME", "index.pinecone.index_name"),
    ("REDIS_URL", "fast_cache.redis_url"),
    ("LANGCACHE_URL", "semantic_cache.url"),
    ("LANGCACHE_API_KEY", "semantic_cache.api_key"),
];

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub embedding: GeminiEmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub fast_cache: CacheConfig,
    #[serde(default)]
    pub semantic_cache: SemanticCacheConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Loads `config/default`, `config/local`, `RAG__*` variables and the
    /// well-known deployment variables, later sources winning.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("RAG")
                    .separator("__")
                    .try_parsing(true),
            );

        let builder = apply_well_known_env(builder, |name| std::env::var(name).ok())?;

        builder.build()?.try_deserialize()
    }
}

fn apply_well_known_env(
    mut builder: config::ConfigBuilder<config::builder::DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    for (variable, key) in WELL_KNOWN_ENV {
        let value = lookup(variable).filter(|v| !v.trim().is_empty());
        builder = builder.set_override_option(*key, value)?;
    }
    Ok(builder)
}

//! CLI module for the retrieval core
//!
//! Subcommands:
//! - `query`: similarity search through the fast cache and corpus index
//! - `ingest`: load a JSON / JSONL dataset into the corpus index
//! - `stats`: describe the configured stores
//! - `semantic-cache`: manual access to the semantic response cache

pub mod ingest;
pub mod query;
pub mod semantic_cache;
pub mod stats;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Hybrid retrieval and caching over a prompt corpus
#[derive(Parser)]
#[command(name = "hybrid-rag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Find the prompts most similar to a text
    Query(query::QueryArgs),

    /// Embed and upsert a dataset
    Ingest(ingest::IngestArgs),

    /// Show embedding, index and cache status
    Stats(stats::StatsArgs),

    /// Read or write the semantic response cache
    #[command(subcommand)]
    SemanticCache(semantic_cache::SemanticCacheCommand),
}

/// Loads `.env` and the layered configuration, then installs logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging)?;

    Ok(config)
}

//! Semantic cache commands

use clap::{Args, Subcommand};

use crate::context::RagContext;

#[derive(Subcommand, Clone, Debug)]
pub enum SemanticCacheCommand {
    /// Look up a cached response for a similar prompt
    Get(GetArgs),
    /// Store a response for a prompt
    Put(PutArgs),
}

#[derive(Args, Clone, Debug)]
pub struct GetArgs {
    pub prompt: String,

    /// Minimum similarity in `[0, 1]` (defaults to `semantic_cache.similarity_threshold`)
    #[arg(long)]
    pub threshold: Option<f32>,
}

#[derive(Args, Clone, Debug)]
pub struct PutArgs {
    pub prompt: String,
    pub response: String,
}

pub async fn run(command: SemanticCacheCommand) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let service = RagContext::from_config(&config)?.semantic_cache_service();

    if !service.is_enabled() {
        anyhow::bail!("semantic cache is not configured (set LANGCACHE_URL and LANGCACHE_API_KEY)");
    }

    match command {
        SemanticCacheCommand::Get(args) => match service.get(&args.prompt, args.threshold).await {
            Some(response) => println!("{}", response),
            None => anyhow::bail!("no cached response"),
        },
        SemanticCacheCommand::Put(args) => {
            if !service.put(&args.prompt, &args.response).await {
                anyhow::bail!("semantic cache rejected the entry");
            }
            println!("stored");
        }
    }

    Ok(())
}

use clap::Parser;
use hybrid_rag::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Query(args) => cli::query::run(args).await,
        Command::Ingest(args) => cli::ingest::run(args).await,
        Command::Stats(args) => cli::stats::run(args).await,
        Command::SemanticCache(command) => cli::semantic_cache::run(command).await,
    }
}

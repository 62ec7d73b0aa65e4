//! Stats command

use clap::Args;

use crate::context::RagContext;

#[derive(Args, Clone, Debug)]
pub struct StatsArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: StatsArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let context = RagContext::from_config(&config)?;
    let report = context.stats_service().collect().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Embedding:      {} {} ({} dimensions)",
        report.embedding.provider, report.embedding.model, report.embedding.dimensions
    );

    match (&report.index.stats, &report.index.error) {
        (Some(stats), _) => {
            println!(
                "Corpus index:   {} with {} vectors",
                report.index.backend, stats.total_vector_count
            );
            for (namespace, count) in &stats.namespaces {
                let name = if namespace.is_empty() { "(default)" } else { namespace };
                println!("  {:<24} {}", name, count);
            }
        }
        (None, error) => println!(
            "Corpus index:   {} unavailable: {}",
            report.index.backend,
            error.as_deref().unwrap_or("unknown error")
        ),
    }

    println!(
        "Fast cache:     {} ({})",
        report.fast_cache.backend,
        if report.fast_cache.reachable { "reachable" } else { "unreachable" }
    );
    if let Some(entries) = report.fast_cache.entries {
        println!("  entries        {}", entries);
    }
    println!(
        "Semantic cache: {}",
        if report.semantic_cache_enabled { "enabled" } else { "disabled" }
    );

    Ok(())
}

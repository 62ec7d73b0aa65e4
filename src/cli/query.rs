//! Query command

use clap::Args;

use crate::context::RagContext;
use crate::domain::retrieval::QueryRequest;

#[derive(Args, Clone, Debug)]
pub struct QueryArgs {
    /// Text to search with
    pub text: String,

    /// Number of results (defaults to `query.default_top_k`)
    #[arg(long, short = 'k')]
    pub top_k: Option<usize>,

    /// Only return documents whose `category` metadata equals this
    #[arg(long)]
    pub category: Option<String>,

    /// Index namespace to search (overrides `index.namespace`)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Skip the fast cache read
    #[arg(long)]
    pub no_cache: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let context = RagContext::from_config(&config)?;

    let top_k = args.top_k.unwrap_or(config.query.default_top_k);
    let request = QueryRequest::new(args.text, top_k)
        .with_category(args.category)
        .with_namespace(args.namespace)
        .with_use_cache(!args.no_cache);

    let response = context.query_orchestrator().query_detailed(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{} result(s), fast cache: {}", response.results.len(), response.cache);
    for (rank, result) in response.results.iter().enumerate() {
        println!("{:>2}. [{:.3}] {}", rank + 1, result.similarity, result.content);
        if !result.metadata.is_empty() {
            println!("      {}", serde_json::Value::Object(result.metadata.clone()));
        }
    }

    Ok(())
}

//! Ingest command - loads a dataset into the corpus index

mod dataset;

pub use dataset::{dedupe, load_documents, parse_documents, DatasetFormat};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::context::RagContext;
use crate::domain::retrieval::NewDocument;
use crate::infrastructure::observability::{init_metrics, MetricsConfig};

#[derive(Args, Clone, Debug)]
pub struct IngestArgs {
    /// JSON array or JSON Lines file of prompts or `{content, metadata}` objects
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Records per upsert (overrides `ingestion.batch_size`)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Pause between embedding calls in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Only ingest the first N documents (0 = all)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    /// Target namespace (overrides `ingestion.namespace` and `index.namespace`)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Set the `category` metadata of every document
    #[arg(long)]
    pub category: Option<String>,

    /// Skip documents whose content appears earlier in the file
    #[arg(long)]
    pub dedupe: bool,

    /// Load and report without embedding anything
    #[arg(long)]
    pub dry_run: bool,

    /// Also copy stored records into the fast cache
    #[arg(long)]
    pub hot_cache: bool,

    /// Expose Prometheus metrics on this address while ingesting
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

pub async fn run(args: IngestArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let documents = prepare(load_documents(&args.input)?, &args);
    info!(documents = documents.len(), input = %args.input.display(), "Dataset loaded");

    if args.dry_run {
        println!("[dry run] would ingest {} documents", documents.len());
        if let Some(first) = documents.first() {
            let sample: String = first.content.chars().take(100).collect();
            println!("sample: {}", sample);
        }
        return Ok(());
    }

    let metrics = match args.metrics_addr {
        Some(addr) => MetricsConfig::listening_on(addr),
        None => config.metrics.clone(),
    };
    if init_metrics(&metrics)? {
        info!(addr = %metrics.listen_addr, "Prometheus exporter listening");
    }

    let mut ingestion = config.ingestion.clone();
    if let Some(batch_size) = args.batch_size {
        ingestion = ingestion.with_batch_size(batch_size);
    }
    if let Some(delay_ms) = args.delay_ms {
        ingestion = ingestion.with_embed_delay(Duration::from_millis(delay_ms));
    }
    if args.namespace.is_some() {
        ingestion = ingestion.with_namespace(args.namespace.clone());
    }
    if args.hot_cache {
        ingestion = ingestion.with_hot_cache(true);
    }

    let pipeline = RagContext::from_config(&config)?.ingestion_pipeline_with(ingestion)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, stopping after the current document");
            on_interrupt.cancel();
        }
    });

    let total = documents.len();
    let report = pipeline.ingest_batch_with_cancel(documents, &cancel).await?;

    let elapsed = report
        .elapsed()
        .map(|d| d.num_milliseconds() as f64 / 1000.0)
        .unwrap_or_default();
    println!(
        "Ingested {}/{} documents in {} upsert(s), {} error(s), {:.1}s",
        report.ingested(),
        total,
        report.upserts.len(),
        report.error_count,
        elapsed
    );
    if report.hot_cached > 0 {
        println!("Hot-cached {} record(s)", report.hot_cached);
    }
    if let Some(reason) = &report.aborted {
        anyhow::bail!("ingestion stopped early: {}", reason);
    }

    Ok(())
}

/// Applies `--dedupe`, `--limit` and `--category` in that order
fn prepare(documents: Vec<NewDocument>, args: &IngestArgs) -> Vec<NewDocument> {
    let mut documents = if args.dedupe {
        dedupe(documents)
    } else {
        documents
    };

    if args.limit > 0 {
        documents.truncate(args.limit);
    }

    if let Some(category) = &args.category {
        documents = documents
            .into_iter()
            .map(|document| document.with_metadata("category", category.as_str()))
            .collect();
    }

    documents
}

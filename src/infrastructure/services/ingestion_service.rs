//! Document ingestion into the corpus index

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::cache::CacheExt;
use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::index::{CorpusIndex, Metadata, VectorRecord};
use crate::domain::ingestion::{
    validate_content, AbortReason, DocumentError, HotCacheEntry, IngestionConfig, IngestionReport,
};
use crate::domain::retrieval::NewDocument;
use crate::domain::DomainError;
use crate::infrastructure::cache::{CacheConfig, FastCacheHandle};
use crate::infrastructure::observability::{
    record_hot_cache_writes, record_index_upsert, record_ingested_documents,
    record_ingestion_error,
};

/// Embeds documents one at a time and upserts them in batches.
///
/// Per-document failures are skipped until the error budget is exceeded.
/// Index failures stop the run. Configuration errors fail the whole call.
/// With `hot_cache` set, stored records are also copied into the fast cache;
/// those writes never affect the outcome.
#[derive(Debug)]
pub struct IngestionPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn CorpusIndex>,
    config: IngestionConfig,
    fast_cache: Option<FastCacheHandle>,
    cache_op_timeout: Duration,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn CorpusIndex>,
        config: IngestionConfig,
    ) -> Result<Self, DomainError> {
        config.validate()?;

        Ok(Self {
            embedder,
            index,
            config,
            fast_cache: None,
            cache_op_timeout: CacheConfig::default().op_timeout(),
        })
    }

    pub fn with_fast_cache(mut self, cache: Option<FastCacheHandle>) -> Self {
        self.fast_cache = cache;
        self
    }

    pub fn with_cache_config(mut self, config: &CacheConfig) -> Self {
        self.cache_op_timeout = config.op_timeout();
        self
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Ingests a dataset to completion or until it is aborted
    pub async fn ingest_batch(
        &self,
        documents: Vec<NewDocument>,
    ) -> Result<IngestionReport, DomainError> {
        self.ingest_batch_with_cancel(documents, &CancellationToken::new())
            .await
    }

    /// Same as [`ingest_batch`](Self::ingest_batch), checking `cancel` before
    /// each embedding call. Records embedded before cancellation are flushed.
    #[instrument(skip(self, documents, cancel), fields(documents = documents.len()))]
    pub async fn ingest_batch_with_cancel(
        &self,
        documents: Vec<NewDocument>,
        cancel: &CancellationToken,
    ) -> Result<IngestionReport, DomainError> {
        let total = documents.len();
        let delay = self.config.embed_delay();
        let mut report = IngestionReport::started();
        let mut buffer: Vec<VectorRecord> = Vec::with_capacity(self.config.batch_size);

        for (position, document) in documents.into_iter().enumerate() {
            if position > 0 && !delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            if cancel.is_cancelled() {
                info!(processed = position, "Ingestion cancelled");
                report.aborted = Some(AbortReason::Cancelled);
                break;
            }

            match self.embed_document(&document).await {
                Ok(record) => buffer.push(record),
                Err(e) if e.is_configuration() => return Err(e),
                Err(e) => {
                    warn!(document = position, error = %e, "Skipping document");
                    record_ingestion_error();
                    report.record_error(DocumentError::new(position, e.to_string()));

                    if report.error_count > self.config.error_budget {
                        error!(
                            errors = report.error_count,
                            budget = self.config.error_budget,
                            "Too many errors, aborting dataset"
                        );
                        report.aborted = Some(AbortReason::ErrorBudgetExceeded);
                        break;
                    }
                    continue;
                }
            }

            if buffer.len() >= self.config.batch_size {
                if let Some(reason) = self.flush(&mut buffer, &mut report).await? {
                    report.aborted = Some(reason);
                    report.finish();
                    return Ok(report);
                }
                info!(ingested = report.ingested(), total, "Batch upserted");
            }
        }

        if let Some(reason) = self.flush(&mut buffer, &mut report).await? {
            report.aborted = Some(reason);
        }
        report.finish();

        info!(
            ingested = report.ingested(),
            errors = report.error_count,
            aborted = report.aborted.as_ref().map(|r| r.to_string()),
            "Ingestion finished"
        );

        Ok(report)
    }

    /// Ingests one document, returning its id
    pub async fn ingest(&self, content: &str, metadata: Metadata) -> Result<String, DomainError> {
        let document = NewDocument::new(content).with_all_metadata(metadata);
        let record = self.embed_document(&document).await?;
        let id = record.id.clone();
        let hot = self.hot_entries(std::slice::from_ref(&record));

        self.index
            .upsert(self.config.namespace.as_deref(), vec![record])
            .await?;
        record_index_upsert(1);
        record_ingested_documents(1);
        self.write_hot_cache(hot).await;
        debug!(id = %id, "Document ingested");

        Ok(id)
    }

    async fn embed_document(&self, document: &NewDocument) -> Result<VectorRecord, DomainError> {
        validate_content(&document.content)?;

        let vector = self
            .embedder
            .embed(EmbeddingRequest::document(&document.content))
            .await?;

        Ok(VectorRecord::new(
            Uuid::new_v4().to_string(),
            vector,
            document.index_metadata(self.config.content_limit),
        ))
    }

    /// Upserts and clears the buffer in chunks the index accepts whole.
    ///
    /// Returns the abort reason on index failure; ids of chunks stored before
    /// the failure stay in the report.
    async fn flush(
        &self,
        buffer: &mut Vec<VectorRecord>,
        report: &mut IngestionReport,
    ) -> Result<Option<AbortReason>, DomainError> {
        let chunk_size = self.index.max_upsert_batch().max(1);
        let mut records = std::mem::take(buffer).into_iter().peekable();

        while records.peek().is_some() {
            let chunk: Vec<VectorRecord> = records.by_ref().take(chunk_size).collect();
            let ids: Vec<String> = chunk.iter().map(|r| r.id.clone()).collect();
            let hot = self.hot_entries(&chunk);
            let count = ids.len();

            match self
                .index
                .upsert(self.config.namespace.as_deref(), chunk)
                .await
            {
                Ok(_) => {
                    report.record_flush(ids);
                    record_index_upsert(count);
                    record_ingested_documents(count);
                    report.hot_cached += self.write_hot_cache(hot).await;
                }
                Err(e) if e.is_configuration() => return Err(e),
                Err(e) => {
                    error!(batch = count, error = %e, "Upsert failed, stopping ingestion");
                    return Ok(Some(AbortReason::IndexFailure(e.to_string())));
                }
            }
        }

        Ok(None)
    }

    fn hot_entries(&self, records: &[VectorRecord]) -> Vec<HotCacheEntry> {
        if !self.config.hot_cache || self.fast_cache.is_none() {
            return Vec::new();
        }
        records.iter().map(HotCacheEntry::from_record).collect()
    }

    /// Best-effort copy of stored records into the fast cache; returns how many landed.
    ///
    /// The first failed or slow write skips the rest of the chunk.
    async fn write_hot_cache(&self, entries: Vec<HotCacheEntry>) -> usize {
        let Some(handle) = &self.fast_cache else {
            return 0;
        };
        if entries.is_empty() {
            return 0;
        }

        let cache = match tokio::time::timeout(self.cache_op_timeout, handle.get()).await {
            Ok(Ok(cache)) => cache,
            Ok(Err(e)) => {
                warn!(error = %e, records = entries.len(), "Fast cache unavailable, records not hot-cached");
                record_hot_cache_writes(0, entries.len());
                return 0;
            }
            Err(_) => {
                warn!(records = entries.len(), "Fast cache connect timed out, records not hot-cached");
                record_hot_cache_writes(0, entries.len());
                return 0;
            }
        };

        let ttl = self.config.hot_cache_ttl();
        let mut written = 0;
        for entry in &entries {
            let key = HotCacheEntry::key(&entry.id);
            match tokio::time::timeout(self.cache_op_timeout, cache.set(&key, entry, ttl)).await {
                Ok(Ok(())) => written += 1,
                Ok(Err(e)) => {
                    warn!(id = %entry.id, error = %e, "Hot cache write failed");
                    break;
                }
                Err(_) => {
                    warn!(id = %entry.id, "Hot cache write timed out");
                    break;
                }
            }
        }

        record_hot_cache_writes(written, entries.len() - written);
        debug!(written, records = entries.len(), "Records hot-cached");
        written
    }
}

//! Brute-force in-process corpus index

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::embedding::cosine_distance;
use crate::domain::index::{CorpusIndex, IndexMatch, IndexQuery, IndexStats, VectorRecord};
use crate::domain::DomainError;

/// Corpus index held in memory, scanning every record per query.
///
/// Meant for development runs and tests; nothing is persisted.
#[derive(Debug)]
pub struct InMemoryCorpusIndex {
    dimension: usize,
    namespaces: RwLock<HashMap<String, BTreeMap<String, VectorRecord>>>,
}

impl InMemoryCorpusIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            namespaces: RwLock::new(HashMap::new()),
        }
    }

    fn check_dimension(&self, len: usize, what: &str) -> Result<(), DomainError> {
        if len != self.dimension {
            return Err(DomainError::index(format!(
                "{} has dimension {}, index expects {}",
                what, len, self.dimension
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CorpusIndex for InMemoryCorpusIndex {
    fn backend_name(&self) -> &'static str {
        "in_memory"
    }

    async fn upsert(
        &self,
        namespace: Option<&str>,
        records: Vec<VectorRecord>,
    ) -> Result<usize, DomainError> {
        for record in &records {
            self.check_dimension(record.values.len(), &format!("record {}", record.id))?;
        }

        let count = records.len();
        let mut namespaces = self.namespaces.write().await;
        let collection = namespaces
            .entry(namespace.unwrap_or_default().to_string())
            .or_default();

        for record in records {
            collection.insert(record.id.clone(), record);
        }

        Ok(count)
    }

    async fn query(&self, query: IndexQuery) -> Result<Vec<IndexMatch>, DomainError> {
        self.check_dimension(query.vector.len(), "query vector")?;

        let namespaces = self.namespaces.read().await;
        let Some(collection) = namespaces.get(query.namespace.as_deref().unwrap_or_default())
        else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<IndexMatch> = collection
            .values()
            .filter(|record| {
                query
                    .filter
                    .as_ref()
                    .is_none_or(|filter| filter.matches(&record.metadata))
            })
            .map(|record| {
                IndexMatch::new(
                    record.id.clone(),
                    cosine_distance(&query.vector, &record.values),
                    record.metadata.clone(),
                )
            })
            .collect();

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(query.top_k);

        Ok(matches)
    }

    async fn stats(&self) -> Result<IndexStats, DomainError> {
        let namespaces = self.namespaces.read().await;
        let mut stats = IndexStats {
            dimension: Some(self.dimension),
            ..Default::default()
        };

        for (name, collection) in namespaces.iter() {
            stats.namespaces.insert(name.clone(), collection.len() as u64);
            stats.total_vector_count += collection.len() as u64;
        }

        Ok(stats)
    }
}

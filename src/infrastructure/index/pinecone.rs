//! Pinecone data-plane client

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::index::{
    CorpusIndex, IndexMatch, IndexQuery, IndexStats, Metadata, MetadataFilter, VectorRecord,
};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

const API_VERSION: &str = "2024-07";

/// Vectors sent per upsert request
const MAX_UPSERT_BATCH: usize = 100;

/// Pinecone connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PineconeConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    /// Index host, e.g. `my-index-abc123.svc.us-east-1.pinecone.io`
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub index_name: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            host: None,
            index_name: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl PineconeConfig {
    pub fn new(api_key: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            host: Some(host.into()),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Corpus index backed by a Pinecone serverless or pod index.
///
/// Pinecone ranks by cosine score; matches are converted to distance
/// `1 - score` on the way out.
#[derive(Debug)]
pub struct PineconeIndex<C: HttpClientTrait> {
    client: C,
    config: PineconeConfig,
}

impl<C: HttpClientTrait> PineconeIndex<C> {
    pub fn new(client: C, config: PineconeConfig) -> Self {
        Self { client, config }
    }

    pub fn index_name(&self) -> Option<&str> {
        self.config.index_name.as_deref()
    }

    fn base_url(&self) -> Result<String, DomainError> {
        let host = self
            .config
            .host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .ok_or_else(|| DomainError::configuration("PINECONE_HOST is not set"))?;

        let host = host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            Ok(host.to_string())
        } else {
            Ok(format!("https://{}", host))
        }
    }

    fn api_key(&self) -> Result<&str, DomainError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| DomainError::configuration("PINECONE_API_KEY is not set"))
    }

    async fn post(
        &self,
        path: &str,
        operation: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        let url = format!("{}{}", self.base_url()?, path);
        let headers = vec![
            ("Api-Key", self.api_key()?),
            ("X-Pinecone-API-Version", API_VERSION),
            ("Content-Type", "application/json"),
        ];

        self.client
            .post_json(&url, headers, body)
            .await
            .map_err(|e| e.into_domain(operation, DomainError::index))
    }

    fn build_filter(filter: &MetadataFilter) -> serde_json::Value {
        let predicates: serde_json::Map<String, serde_json::Value> = filter
            .predicates()
            .map(|(key, value)| (key.clone(), serde_json::json!({ "$eq": value })))
            .collect();

        serde_json::Value::Object(predicates)
    }

    fn build_query(query: &IndexQuery) -> serde_json::Value {
        let mut body = serde_json::json!({
            "vector": query.vector,
            "topK": query.top_k,
            "includeMetadata": true,
            "includeValues": false,
        });

        if let Some(namespace) = &query.namespace {
            body["namespace"] = serde_json::json!(namespace);
        }

        if let Some(filter) = query.filter.as_ref().filter(|f| !f.is_empty()) {
            body["filter"] = Self::build_filter(filter);
        }

        body
    }
}

#[async_trait]
impl<C: HttpClientTrait> CorpusIndex for PineconeIndex<C> {
    fn backend_name(&self) -> &'static str {
        "pinecone"
    }

    fn max_upsert_batch(&self) -> usize {
        MAX_UPSERT_BATCH
    }

    async fn upsert(
        &self,
        namespace: Option<&str>,
        records: Vec<VectorRecord>,
    ) -> Result<usize, DomainError> {
        let mut upserted = 0;

        for chunk in records.chunks(MAX_UPSERT_BATCH) {
            let mut body = serde_json::json!({ "vectors": chunk });
            if let Some(namespace) = namespace {
                body["namespace"] = serde_json::json!(namespace);
            }

            let response = self.post("/vectors/upsert", "pinecone upsert", &body).await?;
            let parsed = match serde_json::from_value::<UpsertResponse>(response) {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!(error = %e, "Unrecognized upsert response, assuming the whole chunk");
                    UpsertResponse::default()
                }
            };
            upserted += parsed.upserted_count.unwrap_or(chunk.len());
        }

        debug!(count = upserted, namespace = namespace.unwrap_or(""), "Upserted vectors");
        Ok(upserted)
    }

    async fn query(&self, query: IndexQuery) -> Result<Vec<IndexMatch>, DomainError> {
        let body = Self::build_query(&query);
        let response = self.post("/query", "pinecone query", &body).await?;

        let parsed: QueryResponse = serde_json::from_value(response).map_err(|e| {
            DomainError::index(format!("Failed to parse Pinecone query response: {}", e))
        })?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| IndexMatch::new(m.id, 1.0 - m.score, m.metadata.unwrap_or_default()))
            .collect())
    }

    async fn stats(&self) -> Result<IndexStats, DomainError> {
        let response = self
            .post(
                "/describe_index_stats",
                "pinecone describe_index_stats",
                &serde_json::json!({}),
            )
            .await?;

        let parsed: DescribeStatsResponse = serde_json::from_value(response).map_err(|e| {
            DomainError::index(format!("Failed to parse Pinecone stats response: {}", e))
        })?;

        Ok(IndexStats {
            total_vector_count: parsed.total_vector_count,
            dimension: parsed.dimension,
            namespaces: parsed
                .namespaces
                .into_iter()
                .map(|(name, summary)| (name, summary.vector_count))
                .collect(),
        })
    }
}

// Pinecone API types

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    upserted_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<PineconeMatch>,
}

#[derive(Debug, Deserialize)]
struct PineconeMatch {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeStatsResponse {
    #[serde(default)]
    namespaces: BTreeMap<String, NamespaceSummary>,
    dimension: Option<usize>,
    #[serde(default)]
    total_vector_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceSummary {
    #[serde(default)]
    vector_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::mock::MockHttpClient;
    use crate::infrastructure::http_client::HttpError;
    use serde_json::json;

    const HOST: &str = "https://test-index.svc.pinecone.io";

    fn index(client: MockHttpClient) -> PineconeIndex<MockHttpClient> {
        PineconeIndex::new(client, PineconeConfig::new("pc-key", "test-index.svc.pinecone.io"))
    }

    fn record(id: &str) -> VectorRecord {
        VectorRecord::new(id, vec![0.1, 0.2], Metadata::new())
    }

    #[tokio::test]
    async fn test_query_converts_scores_to_distances() {
        let client = MockHttpClient::new().with_response(
            format!("{}/query", HOST),
            json!({
                "matches": [
                    {"id": "a", "score": 0.9, "metadata": {"content": "fog", "category": "landscape"}},
                    {"id": "b", "score": 0.4}
                ],
                "namespace": ""
            }),
        );
        let index = index(client);

        let matches = index
            .query(
                IndexQuery::new(vec![0.1, 0.2], 6)
                    .with_filter(MetadataFilter::eq("category", "landscape"))
                    .with_namespace(Some("video-prompts".into())),
            )
            .await
            .unwrap();

        assert_eq!(matches.len(), 2);
        assert!((matches[0].distance - 0.1).abs() < 0.0001);
        assert_eq!(matches[0].metadata["content"], json!("fog"));
        assert!(matches[1].metadata.is_empty());

        let request = &index.client.requests()[0];
        assert_eq!(request.body["topK"], 6);
        assert_eq!(request.body["includeMetadata"], true);
        assert_eq!(request.body["namespace"], "video-prompts");
        assert_eq!(request.body["filter"], json!({"category": {"$eq": "landscape"}}));
        assert_eq!(request.header("Api-Key"), Some("pc-key"));
    }

    #[tokio::test]
    async fn test_query_without_filter_or_namespace() {
        let client = MockHttpClient::new()
            .with_response(format!("{}/query", HOST), json!({"matches": []}));
        let index = index(client);

        let matches = index.query(IndexQuery::new(vec![0.1, 0.2], 2)).await.unwrap();

        assert!(matches.is_empty());
        let body = &index.client.requests()[0].body;
        assert!(body.get("filter").is_none());
        assert!(body.get("namespace").is_none());
    }

    #[tokio::test]
    async fn test_upsert_chunks_large_batches() {
        let client = MockHttpClient::new()
            .with_response(format!("{}/vectors/upsert", HOST), json!({}));
        let index = index(client);

        let records: Vec<VectorRecord> = (0..150).map(|i| record(&format!("doc-{}", i))).collect();
        let count = index.upsert(Some("system-prompts"), records).await.unwrap();

        assert_eq!(count, 150);
        let requests = index.client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].body["vectors"].as_array().unwrap().len(), 100);
        assert_eq!(requests[1].body["vectors"].as_array().unwrap().len(), 50);
        assert_eq!(requests[0].body["namespace"], "system-prompts");
        assert_eq!(index.max_upsert_batch(), 100);
    }

    #[tokio::test]
    async fn test_unrecognized_upsert_response_counts_whole_chunk() {
        let client = MockHttpClient::new()
            .with_response(format!("{}/vectors/upsert", HOST), json!(["unexpected"]));
        let index = index(client);

        let count = index
            .upsert(None, vec![record("a"), record("b")])
            .await
            .unwrap();

        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_stats() {
        let client = MockHttpClient::new().with_response(
            format!("{}/describe_index_stats", HOST),
            json!({
                "namespaces": {"": {"vectorCount": 10}, "video-prompts": {"vectorCount": 5}},
                "dimension": 768,
                "indexFullness": 0.0,
                "totalVectorCount": 15
            }),
        );

        let stats = index(client).stats().await.unwrap();

        assert_eq!(stats.total_vector_count, 15);
        assert_eq!(stats.dimension, Some(768));
        assert_eq!(stats.namespace_count("video-prompts"), 5);
    }

    #[tokio::test]
    async fn test_missing_configuration_fails_closed() {
        let index = PineconeIndex::new(MockHttpClient::new(), PineconeConfig::default());

        let result = index.query(IndexQuery::new(vec![0.1], 1)).await;

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
        assert!(index.client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_http_failure_is_index_error() {
        let client = MockHttpClient::new().with_error(
            format!("{}/vectors/upsert", HOST),
            HttpError::Status {
                status: 500,
                body: "internal".into(),
            },
        );

        let result = index(client).upsert(None, vec![record("a")]).await;
        assert!(matches!(result, Err(DomainError::Index { .. })));
    }

    #[test]
    fn test_base_url_keeps_explicit_scheme() {
        let index = PineconeIndex::new(
            MockHttpClient::new(),
            PineconeConfig::new("k", "http://localhost:5080/"),
        );

        assert_eq!(index.base_url().unwrap(), "http://localhost:5080");
    }
}

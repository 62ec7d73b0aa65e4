//! Google Gemini embedding provider implementation

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::embedding::{
    check_dimensions, EmbeddingProvider, EmbeddingRequest, EmbeddingTask,
};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

const PROVIDER: &str = "gemini";

/// Gemini embedding settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiEmbeddingConfig {
    /// API key; embedding calls fail with a configuration error when absent
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Expected vector length
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Sent as `outputDimensionality` for models that can truncate
    #[serde(default)]
    pub output_dimensionality: Option<usize>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "embedding-001".to_string()
}

fn default_dimensions() -> usize {
    768
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GeminiEmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            dimensions: default_dimensions(),
            output_dimensionality: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GeminiEmbeddingConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Gemini `embedContent` provider
#[derive(Debug)]
pub struct GeminiEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    config: GeminiEmbeddingConfig,
    base_url: String,
}

impl<C: HttpClientTrait> GeminiEmbeddingProvider<C> {
    pub fn new(client: C, config: GeminiEmbeddingConfig) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Self {
            client,
            config,
            base_url,
        }
    }

    fn model_path(&self) -> String {
        if self.config.model.starts_with("models/") {
            self.config.model.clone()
        } else {
            format!("models/{}", self.config.model)
        }
    }

    fn embed_url(&self) -> String {
        format!("{}/v1beta/{}:embedContent", self.base_url, self.model_path())
    }

    fn api_key(&self) -> Result<&str, DomainError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| DomainError::configuration("GOOGLE_API_KEY is not set"))
    }

    fn task_type(task: EmbeddingTask) -> &'static str {
        match task {
            EmbeddingTask::Document => "RETRIEVAL_DOCUMENT",
            EmbeddingTask::Query => "RETRIEVAL_QUERY",
        }
    }

    fn build_request(&self, request: &EmbeddingRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model_path(),
            "content": { "parts": [{ "text": request.text() }] },
            "taskType": Self::task_type(request.task()),
        });

        if let Some(dims) = self.config.output_dimensionality {
            body["outputDimensionality"] = serde_json::json!(dims);
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<Vec<f32>, DomainError> {
        let response: GeminiEmbedResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::embedding(PROVIDER, format!("Failed to parse embedding response: {}", e))
        })?;

        check_dimensions(PROVIDER, response.embedding.values, self.config.dimensions)
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for GeminiEmbeddingProvider<C> {
    async fn embed(&self, request: EmbeddingRequest) -> Result<Vec<f32>, DomainError> {
        let api_key = self.api_key()?;
        let url = self.embed_url();
        let body = self.build_request(&request);
        let headers = vec![
            ("x-goog-api-key", api_key),
            ("Content-Type", "application/json"),
        ];

        let response = self
            .client
            .post_json(&url, headers, &body)
            .await
            .map_err(|e| {
                e.into_domain("gemini embedContent", |message| {
                    DomainError::embedding(PROVIDER, message)
                })
            })?;

        self.parse_response(response)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedResponse {
    embedding: GeminiEmbedding,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedding {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::mock::MockHttpClient;
    use crate::infrastructure::http_client::HttpError;

    const TEST_URL: &str =
        "https://generativelanguage.googleapis.com/v1beta/models/embedding-001:embedContent";

    fn config() -> GeminiEmbeddingConfig {
        GeminiEmbeddingConfig::default()
            .with_api_key("test-key")
            .with_dimensions(4)
    }

    fn create_mock_response(dimensions: usize) -> serde_json::Value {
        let values: Vec<f32> = (0..dimensions).map(|i| i as f32 * 0.1).collect();
        serde_json::json!({ "embedding": { "values": values } })
    }

    #[tokio::test]
    async fn test_embed_document_uses_document_task() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(4));
        let provider = GeminiEmbeddingProvider::new(client, config());

        let vector = provider
            .embed(EmbeddingRequest::document("a red fox"))
            .await
            .unwrap();

        assert_eq!(vector.len(), 4);

        let requests = provider.client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body["taskType"], "RETRIEVAL_DOCUMENT");
        assert_eq!(requests[0].body["content"]["parts"][0]["text"], "a red fox");
        assert_eq!(requests[0].header("x-goog-api-key"), Some("test-key"));
        assert!(requests[0].body.get("outputDimensionality").is_none());
    }

    #[tokio::test]
    async fn test_embed_query_uses_query_task() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(4));
        let provider = GeminiEmbeddingProvider::new(client, config());

        provider.embed(EmbeddingRequest::query("fox")).await.unwrap();

        assert_eq!(provider.client.requests()[0].body["taskType"], "RETRIEVAL_QUERY");
    }

    #[tokio::test]
    async fn test_output_dimensionality_sent_when_configured() {
        let url = "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:embedContent";
        let client = MockHttpClient::new().with_response(url, create_mock_response(4));
        let provider = GeminiEmbeddingProvider::new(
            client,
            GeminiEmbeddingConfig {
                model: "text-embedding-004".into(),
                output_dimensionality: Some(4),
                ..config()
            },
        );

        provider.embed(EmbeddingRequest::query("fox")).await.unwrap();

        assert_eq!(provider.client.requests()[0].body["outputDimensionality"], 4);
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_embedding_error() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(3));
        let provider = GeminiEmbeddingProvider::new(client, config());

        let result = provider.embed(EmbeddingRequest::document("fox")).await;

        assert!(matches!(result, Err(DomainError::Embedding { .. })));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let client = MockHttpClient::new();
        let provider = GeminiEmbeddingProvider::new(client, GeminiEmbeddingConfig::default());

        let result = provider.embed(EmbeddingRequest::query("fox")).await;

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
        assert!(provider.client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_http_errors_are_mapped() {
        let client = MockHttpClient::new().with_error(
            TEST_URL,
            HttpError::Status {
                status: 429,
                body: "quota".into(),
            },
        );
        let provider = GeminiEmbeddingProvider::new(client, config());

        let result = provider.embed(EmbeddingRequest::query("fox")).await;
        assert!(matches!(result, Err(DomainError::Embedding { .. })));
    }

    #[tokio::test]
    async fn test_timeout_is_timeout_error() {
        let client = MockHttpClient::new().with_error(TEST_URL, HttpError::Timeout);
        let provider = GeminiEmbeddingProvider::new(client, config());

        let result = provider.embed(EmbeddingRequest::query("fox")).await;
        assert!(matches!(result, Err(DomainError::Timeout { .. })));
    }

    #[test]
    fn test_provider_info() {
        let provider = GeminiEmbeddingProvider::new(MockHttpClient::new(), config());

        assert_eq!(provider.provider_name(), "gemini");
        assert_eq!(provider.model(), "embedding-001");
        assert_eq!(provider.dimensions(), 4);
    }
}

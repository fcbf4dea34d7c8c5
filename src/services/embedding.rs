//! Embedding client for generating text embeddings.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

/// Maps text to fixed-dimension dense vectors.
///
/// Chunk vectors and query vectors must come from the same embedder so
/// distances between them are meaningful. Batch embedding is elementwise
/// equivalent to embedding each text alone.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Vector length this embedder produces.
    fn dimension(&self) -> usize;

    /// Embed a batch of document chunks.
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Request body for the /embed endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest {
    inputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    truncate: Option<bool>,
}

/// Response from the /embed endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse(Vec<Vec<f32>>);

/// Health response from the /health endpoint.
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
}

/// HTTP client for the embedding server.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    dimension: usize,
    batch_size: usize,
}

impl EmbeddingClient {
    /// Create a new embedding client with the given configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            dimension: config.dimension,
            batch_size: config.batch_size.max(1) as usize,
        })
    }

    /// Check if the embedding server is healthy and ready.
    pub async fn health_check(&self) -> Result<HealthResponse, EmbeddingError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmbeddingError::ServerError(format!(
                "health check failed with status: {}",
                response.status()
            )));
        }

        // Server may return an empty body on health check
        let text = response.text().await.unwrap_or_default();
        if text.is_empty() {
            return Ok(HealthResponse {
                status: Some("healthy".to_string()),
                model_id: None,
            });
        }

        serde_json::from_str(&text).map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))
    }

    /// Embed a single batch against the server and validate dimensions.
    async fn embed_single_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let expected = texts.len();
        let url = format!("{}/embed", self.base_url);
        let request = EmbedRequest {
            inputs: texts,
            truncate: Some(true),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        let vectors = embed_response.0;
        if vectors.len() != expected {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} vectors, got {}",
                expected,
                vectors.len()
            )));
        }
        for v in &vectors {
            if v.len() != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: v.len(),
                });
            }
        }

        Ok(vectors)
    }

    /// Get the base URL of the embedding server.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let embeddings = self.embed_single_batch(chunk.to_vec()).await?;
            all_embeddings.extend(embeddings);
        }
        Ok(all_embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let embeddings = self.embed_single_batch(vec![text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }
}

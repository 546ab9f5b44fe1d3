use std::time::Duration;

use async_trait::async_trait;
use embedflow_domain::error::{Error, Result};
use embedflow_domain::ports::providers::EmbeddingProvider;
use embedflow_domain::value_objects::EmbeddingVector;
use serde::{Deserialize, Serialize};

use crate::constants::http::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Configuration of the HTTP embedding provider.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingConfig {
    /// Embeddings endpoint URL
    pub endpoint: String,
    /// Model identifier sent with each request
    pub model: String,
    /// Bearer token, when the endpoint requires one
    pub api_key: Option<String>,
    /// Vector dimensionality of the model
    pub dimensions: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl HttpEmbeddingConfig {
    /// Config with the default request timeout.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            dimensions,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: i64,
}

/// HTTP embedding provider speaking the OpenAI-style embeddings contract.
pub struct HttpEmbeddingProvider {
    config: HttpEmbeddingConfig,
    client: reqwest::Client,
}

impl HttpEmbeddingProvider {
    /// Build the provider and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: HttpEmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::embedding_with_source("failed to build HTTP client", e))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let mut request = self.client.post(&self.config.endpoint).json(&EmbeddingRequest {
            model: &self.config.model,
            input: text,
        });
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::network_with_source("embedding request failed", e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "embedding endpoint returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding_with_source("invalid embedding response", e))?;
        let datum = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("embedding response carried no vectors"))?;

        if datum.embedding.len() != self.config.dimensions {
            return Err(Error::embedding(format!(
                "expected {} dimensions, got {}",
                self.config.dimensions,
                datum.embedding.len()
            )));
        }

        let token_count = parsed.usage.map_or(0, |usage| usage.total_tokens);
        Ok(EmbeddingVector::new(datum.embedding, token_count))
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn provider_name(&self) -> &str {
        "http"
    }
}

use std::time::Duration;

use async_trait::async_trait;
use embedflow_domain::entities::AccountSecrets;
use embedflow_domain::error::{Error, Result};
use embedflow_domain::ports::providers::QaSummaryProvider;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::embedding::QA_SYSTEM_PROMPT;
use crate::constants::http::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Configuration of the HTTP QA summary provider.
#[derive(Debug, Clone)]
pub struct QaEndpointConfig {
    /// Chat-completions endpoint URL
    pub endpoint: String,
    /// Model identifier sent with each request
    pub model: String,
    /// Bearer token, when the endpoint requires one
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl QaEndpointConfig {
    /// Config with the default request timeout.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// HTTP QA summary provider: one chat-completions call per micro-chunk
/// producing question-style expansions. The account secrets may override
/// the bearer token per document.
pub struct HttpQaSummaryProvider {
    config: QaEndpointConfig,
    client: reqwest::Client,
}

impl HttpQaSummaryProvider {
    /// Build the provider and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: QaEndpointConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::embedding_with_source("failed to build HTTP client", e))?;
        Ok(Self { config, client })
    }

    fn bearer_token<'a>(&'a self, account: &'a AccountSecrets) -> Option<&'a str> {
        account
            .data
            .get("apiKey")
            .and_then(Value::as_str)
            .or(self.config.api_key.as_deref())
    }
}

#[async_trait]
impl QaSummaryProvider for HttpQaSummaryProvider {
    async fn generate_questions(&self, text: &str, account: &AccountSecrets) -> Result<String> {
        let mut request = self.client.post(&self.config.endpoint).json(&ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: QA_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        });
        if let Some(token) = self.bearer_token(account) {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::network_with_source("QA summary request failed", e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "QA endpoint returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding_with_source("invalid QA response", e))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::embedding("QA response carried no choices"))
    }
}

/// Local QA summary provider: template-based question expansion without an
/// LLM call. Development and test stand-in.
#[derive(Debug, Clone, Default)]
pub struct LocalQaSummaryProvider;

impl LocalQaSummaryProvider {
    /// Create the provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QaSummaryProvider for LocalQaSummaryProvider {
    async fn generate_questions(&self, text: &str, _account: &AccountSecrets) -> Result<String> {
        let preview: String = text.chars().take(60).collect();
        Ok(format!(
            "What does the following passage describe?\nWhat facts are stated about: {preview}?"
        ))
    }
}

use async_trait::async_trait;
use embedflow_domain::entities::AccountSecrets;
use embedflow_domain::error::{Error, Result};
use embedflow_domain::ports::providers::SecretsProvider;
use serde_json::Value;

/// Secrets provider returning one configured account payload for every
/// document. Suits single-tenant deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretsProvider {
    data: Value,
}

impl StaticSecretsProvider {
    /// Create a provider handing out `data` for every document.
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self { data }
    }
}

#[async_trait]
impl SecretsProvider for StaticSecretsProvider {
    async fn rag_secrets_for_document(&self, _document: &str) -> Result<AccountSecrets> {
        Ok(AccountSecrets {
            data: self.data.clone(),
        })
    }
}

/// Secrets provider that always fails resolution. Models a missing or
/// misconfigured secret source; the worker fails the parent before any
/// child work when it sees this.
#[derive(Debug, Clone, Default)]
pub struct UnavailableSecretsProvider;

impl UnavailableSecretsProvider {
    /// Create the provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecretsProvider for UnavailableSecretsProvider {
    async fn rag_secrets_for_document(&self, document: &str) -> Result<AccountSecrets> {
        Err(Error::credential(format!(
            "failed to retrieve RAG secrets for {document}"
        )))
    }
}

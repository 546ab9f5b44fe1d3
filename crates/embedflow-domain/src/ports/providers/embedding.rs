use async_trait::async_trait;

use crate::entities::AccountSecrets;
use crate::error::Result;
use crate::value_objects::EmbeddingVector;

/// Embedding generation.
///
/// Contract: given text, produce an N-dimensional float vector and the
/// token count the model consumed. N is fixed per provider instance.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    ///
    /// # Returns
    /// Ok(vector + token count)
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;

    /// Number of dimensions produced by this provider.
    fn dimensions(&self) -> usize;

    /// Get the name/identifier of this embedding provider
    fn provider_name(&self) -> &str;
}

/// QA summary generation: an LLM call producing question-style expansions
/// of a chunk, embedded alongside the raw content to improve question-form
/// retrieval.
#[async_trait]
pub trait QaSummaryProvider: Send + Sync {
    /// Produce question-style expansions for a text.
    ///
    /// # Arguments
    /// * `text` - the preprocessed chunk text
    /// * `account` - per-document account secrets for the LLM call
    async fn generate_questions(&self, text: &str, account: &AccountSecrets) -> Result<String>;
}

/// Per-document secret resolution. A failure here fails the whole document
/// before any child work starts.
#[async_trait]
pub trait SecretsProvider: Send + Sync {
    /// Resolve account secrets for a document.
    async fn rag_secrets_for_document(&self, document: &str) -> Result<AccountSecrets>;
}

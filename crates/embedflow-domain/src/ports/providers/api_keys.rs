use async_trait::async_trait;

use crate::entities::ApiKeyRecord;
use crate::error::Result;

/// API key resolution for task dispatch.
#[async_trait]
pub trait ApiKeyResolver: Send + Sync {
    /// Resolve a key id to a usable key.
    ///
    /// # Returns
    /// Ok(record) when the key exists and is active, not expired, and not
    /// rate limited; a credential error otherwise
    async fn resolve(&self, api_key_id: &str) -> Result<ApiKeyRecord>;
}

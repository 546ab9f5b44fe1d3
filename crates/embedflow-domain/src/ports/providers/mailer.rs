use async_trait::async_trait;

use crate::error::Result;

/// Email notification delivery. Sends are best-effort: the callback sink
/// logs failures and never lets them block log reconciliation.
#[async_trait]
pub trait MailerProvider: Send + Sync {
    /// Send one email.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

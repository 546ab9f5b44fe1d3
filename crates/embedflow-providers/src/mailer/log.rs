use std::sync::Mutex;

use async_trait::async_trait;
use embedflow_domain::error::Result;
use embedflow_domain::ports::providers::MailerProvider;
use tracing::info;

/// One recorded send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Body text
    pub body: String,
}

/// Mailer that logs instead of sending. Deployments without an outbound
/// mail integration use this; tests read back the recorded sends.
#[derive(Debug, Default)]
pub struct LogMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl LogMailer {
    /// Create the mailer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded sends, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MailerProvider for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        info!(to = %to, subject = %subject, "Mail notification (log-only)");
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentMail {
                to: to.to_owned(),
                subject: subject.to_owned(),
                body: body.to_owned(),
            });
        }
        Ok(())
    }
}

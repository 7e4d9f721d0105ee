//! Mailer used when SMTP is not configured: writes the message to the log.

use async_trait::async_trait;

use crate::delivery::email::EmailError;
use crate::mailer::{Mailer, OutgoingEmail};

/// Logs every email at `debug` instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        tracing::debug!(
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "SMTP not configured, email logged instead of sent",
        );
        Ok(())
    }
}

//! The [`Mailer`] trait and the message it sends.

use async_trait::async_trait;

use crate::delivery::email::EmailError;

/// A plain-text email ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Sends emails. Implementations must be shareable across request tasks.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}

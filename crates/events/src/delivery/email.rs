//! SMTP delivery through `lettre`.
//!
//! [`EmailConfig::from_env`] yields `None` when `SMTP_HOST` is unset, in which
//! case the server wires up [`LogMailer`](crate::LogMailer) instead.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::mailer::{Mailer, OutgoingEmail};

const DEFAULT_PORT: u16 = 587;
const DEFAULT_SENDER: &str = "Research Portal <noreply@portal.local>";

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Sender mailbox, either `addr` or `Name <addr>`.
    pub sender: String,
    /// Username and password, when the relay requires auth.
    pub login: Option<(String, String)>,
}

impl EmailConfig {
    /// `SMTP_HOST` (required), `SMTP_PORT` (587), `SMTP_FROM`,
    /// `SMTP_USER` and `SMTP_PASSWORD` (both or neither).
    pub fn from_env() -> Option<Self> {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let smtp_host = var("SMTP_HOST")?;
        let smtp_port = var("SMTP_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let login = var("SMTP_USER").zip(var("SMTP_PASSWORD"));

        Some(Self {
            smtp_host,
            smtp_port,
            sender: var("SMTP_FROM").unwrap_or_else(|| DEFAULT_SENDER.to_string()),
            login,
        })
    }
}

/// Plain-text mail over a pooled STARTTLS connection.
pub struct SmtpMailer {
    sender: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Fails on a bad relay host or sender. No connection is made here.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let sender: Mailbox = config.sender.parse()?;

        let mut transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);
        if let Some((user, password)) = config.login {
            transport = transport.credentials(Credentials::new(user, password));
        }

        Ok(Self {
            sender,
            transport: transport.build(),
        })
    }
}

pub(crate) fn compose(sender: Mailbox, email: &OutgoingEmail) -> Result<Message, EmailError> {
    let recipient: Mailbox = email.to.parse()?;
    Message::builder()
        .from(sender)
        .to(recipient)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone())
        .map_err(|e| EmailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let message = compose(self.sender.clone(), email)?;
        let response = self.transport.send(message).await?;
        tracing::debug!(to = %email.to, code = %response.code(), "SMTP accepted message");
        Ok(())
    }
}

//! Outgoing email for the research project portal.
//!
//! - [`Mailer`] -- the sending seam used by the API crate.
//! - [`delivery`] -- implementations: SMTP via `lettre`, a log-only
//!   fallback and an in-memory recorder.
//! - [`messages`] -- builders for OTP and project lifecycle emails.

pub mod delivery;
pub mod mailer;
pub mod messages;

pub use delivery::email::{EmailConfig, EmailError, SmtpMailer};
pub use delivery::log::LogMailer;
pub use delivery::memory::MemoryMailer;
pub use mailer::{Mailer, OutgoingEmail};

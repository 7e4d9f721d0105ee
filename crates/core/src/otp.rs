//! One-time passcode rules for email login and email change.
//!
//! Codes are 6 decimal digits. Only a hash of the code is stored; the
//! hashing itself lives in the API crate next to the other credential
//! helpers.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Number of digits in a code.
pub const CODE_LENGTH: usize = 6;

/// Default code lifetime in minutes.
pub const DEFAULT_EXPIRY_MINS: i64 = 10;

/// Default minimum interval between two codes for the same email.
pub const DEFAULT_RESEND_INTERVAL_SECS: i64 = 25;

/// Verification attempts allowed per code.
pub const MAX_ATTEMPTS: i32 = 5;

/// What a code is issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Login,
    EmailChange,
}

impl OtpPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::EmailChange => "email_change",
        }
    }
}

/// Generate a uniformly random zero-padded 6-digit code.
pub fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

/// Check that a client-supplied code has the expected shape.
pub fn validate_code_format(code: &str) -> Result<(), CoreError> {
    if code.len() == CODE_LENGTH && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Code must be exactly {CODE_LENGTH} digits"
        )))
    }
}

/// Enforce the minimum interval between two codes for the same email.
pub fn check_resend_allowed(
    last_sent_at: Option<Timestamp>,
    now: Timestamp,
    interval_secs: i64,
) -> Result<(), CoreError> {
    let Some(last) = last_sent_at else {
        return Ok(());
    };
    let elapsed = (now - last).num_seconds();
    if elapsed >= interval_secs {
        return Ok(());
    }
    let wait = interval_secs - elapsed.max(0);
    Err(CoreError::RateLimited(format!(
        "Please wait {wait} seconds before requesting a new code"
    )))
}

/// Lowercase and trim an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Whether the email's domain is in the allow-list. An empty list allows
/// every domain. Subdomains of an allowed domain are accepted.
pub fn is_email_domain_allowed(email: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    let domain = domain.to_lowercase();
    allowed.iter().any(|a| {
        let a = a.trim().trim_start_matches('@').to_lowercase();
        domain == a || domain.ends_with(&format!(".{a}"))
    })
}

/// Default display name for a new user: the local part of the email.
pub fn display_name_from_email(email: &str) -> String {
    email
        .split_once('@')
        .map_or(email, |(local, _)| local)
        .to_string()
}

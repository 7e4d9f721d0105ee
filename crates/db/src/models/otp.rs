//! Email one-time passcode model and DTOs.

use sqlx::FromRow;
use portal_core::types::{DbId, Timestamp};

/// A row from the `email_otps` table. Never serialized: it holds a code hash.
#[derive(Debug, Clone, FromRow)]
pub struct EmailOtp {
    pub id: DbId,
    pub email: String,
    pub purpose: String,
    pub user_id: Option<DbId>,
    pub code_hash: String,
    pub expires_at: Timestamp,
    pub attempts: i32,
    pub consumed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for issuing a new code.
pub struct CreateEmailOtp {
    pub email: String,
    pub purpose: String,
    pub user_id: Option<DbId>,
    pub code_hash: String,
    pub expires_at: Timestamp,
}

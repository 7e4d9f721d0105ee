//! Refresh-token session model.

use sqlx::FromRow;
use portal_core::types::{DbId, Timestamp};

/// One refresh token issued at login or rotation. Only the SHA-256 hash of
/// the token is stored.
#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub id: DbId,
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    /// Set on rotation or logout. A revoked session never comes back.
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

pub struct CreateSession {
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
}

//! Repository for the `email_otps` table.

use sqlx::PgPool;
use portal_core::types::{DbId, Timestamp};

use crate::models::otp::{CreateEmailOtp, EmailOtp};

const COLUMNS: &str = "id, email, purpose, user_id, code_hash, expires_at, attempts, \
                       consumed_at, created_at";

/// Issues, looks up and consumes one-time passcodes.
pub struct OtpRepo;

impl OtpRepo {
    /// Insert a new code.
    pub async fn create(pool: &PgPool, input: &CreateEmailOtp) -> Result<EmailOtp, sqlx::Error> {
        let query = format!(
            "INSERT INTO email_otps (email, purpose, user_id, code_hash, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailOtp>(&query)
            .bind(&input.email)
            .bind(&input.purpose)
            .bind(input.user_id)
            .bind(&input.code_hash)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// When the last code for this email and purpose was issued.
    pub async fn last_issued_at(
        pool: &PgPool,
        email: &str,
        purpose: &str,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<Timestamp>>(
            "SELECT MAX(created_at) FROM email_otps WHERE email = $1 AND purpose = $2",
        )
        .bind(email)
        .bind(purpose)
        .fetch_one(pool)
        .await
    }

    /// Newest code that is neither consumed nor expired.
    pub async fn find_live(
        pool: &PgPool,
        email: &str,
        purpose: &str,
    ) -> Result<Option<EmailOtp>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM email_otps
             WHERE email = $1 AND purpose = $2
               AND consumed_at IS NULL AND expires_at > NOW()
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, EmailOtp>(&query)
            .bind(email)
            .bind(purpose)
            .fetch_optional(pool)
            .await
    }

    /// Count one failed verification attempt, returning the new total.
    pub async fn record_failed_attempt(pool: &PgPool, id: DbId) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE email_otps SET attempts = attempts + 1 WHERE id = $1 RETURNING attempts",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Mark a code consumed. Returns `false` if it was already consumed.
    pub async fn consume(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE email_otps SET consumed_at = NOW() WHERE id = $1 AND consumed_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

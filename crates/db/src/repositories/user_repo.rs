use portal_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User, UserResponse};

const COLUMNS: &str = "id, email, name, role_id, is_active, last_login_at, created_at, updated_at";

pub struct UserRepo;

impl UserRepo {
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, name, role_id) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.name)
            .bind(input.role_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// `email` must already be normalized.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// The account as shown to its owner, role name resolved.
    pub async fn find_response_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<UserResponse>, sqlx::Error> {
        sqlx::query_as::<_, UserResponse>(
            "SELECT u.id, u.email, u.name, r.name AS role, u.is_active, u.last_login_at, u.created_at \
             FROM users u JOIN roles r ON r.id = u.role_id \
             WHERE u.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Returns `false` when the user does not exist.
    pub async fn rename(pool: &PgPool, id: DbId, name: &str) -> Result<bool, sqlx::Error> {
        let done = sqlx::query("UPDATE users SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(pool)
            .await?;
        Ok(done.rows_affected() == 1)
    }

    /// A clash with another account surfaces as a `uq_users_email` violation.
    pub async fn change_email(pool: &PgPool, id: DbId, email: &str) -> Result<bool, sqlx::Error> {
        let done = sqlx::query("UPDATE users SET email = $2 WHERE id = $1")
            .bind(id)
            .bind(email)
            .execute(pool)
            .await?;
        Ok(done.rows_affected() == 1)
    }

    pub async fn record_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

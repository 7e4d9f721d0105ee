//! Repository for the append-only `audit_logs` table.

use sqlx::PgPool;
use portal_core::types::DbId;

use crate::models::audit::{AuditLog, CreateAuditLog};

/// Column list for `audit_logs` SELECT queries.
const COLUMNS: &str =
    "id, project_id, actor_id, action, status_before, status_after, details, created_at";

/// Provides insert and read operations for audit logs. There is no update
/// or delete: the table rejects both.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append one entry.
    pub async fn create(pool: &PgPool, input: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs (project_id, actor_id, action, status_before, status_after, details)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(input.project_id)
            .bind(input.actor_id)
            .bind(&input.action)
            .bind(&input.status_before)
            .bind(&input.status_after)
            .bind(&input.details)
            .fetch_one(pool)
            .await
    }

    /// Entries for one project, newest first.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs
             WHERE project_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(project_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count entries for one project (for pagination metadata).
    pub async fn count_for_project(pool: &PgPool, project_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM audit_logs WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_one(pool)
        .await
    }
}

//! Audit log entity models and DTOs.
//!
//! Audit logs have no `updated_at` field: rows are immutable once written
//! (enforced by the `trg_audit_logs_append_only` trigger).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use portal_core::types::{DbId, Timestamp};

/// A single audit log entry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub project_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub action: String,
    pub status_before: Option<String>,
    pub status_after: Option<String>,
    pub details: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for inserting a new audit log entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuditLog {
    pub project_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub action: String,
    pub status_before: Option<String>,
    pub status_after: Option<String>,
    pub details: serde_json::Value,
}

/// Paginated response for audit log queries.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogPage {
    pub items: Vec<AuditLog>,
    pub total: i64,
}

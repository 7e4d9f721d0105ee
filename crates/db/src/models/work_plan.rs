//! Work plan entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use portal_core::types::{DbId, Timestamp};

/// A row from the `work_plans` table (1:1 with projects).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkPlan {
    pub id: DbId,
    pub project_id: DbId,
    pub objectives: Option<String>,
    pub methodology: Option<String>,
    pub schedule: serde_json::Value,
    pub team: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating or replacing a project's work plan.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertWorkPlan {
    pub objectives: Option<String>,
    pub methodology: Option<String>,
    /// Free-form list of milestones.
    pub schedule: Option<serde_json::Value>,
    /// Free-form list of team members.
    pub team: Option<serde_json::Value>,
}

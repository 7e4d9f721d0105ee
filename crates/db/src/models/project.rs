//! Project entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use portal_core::error::CoreError;
use portal_core::project_status::ProjectStatus;
use portal_core::types::{DbId, Timestamp};

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub slug: String,
    pub title: String,
    pub objectives: Option<String>,
    pub justification: Option<String>,
    pub scope: Option<String>,
    pub status: String,
    pub owner_id: DbId,
    pub reviewer_id: Option<DbId>,
    pub submitted_at: Option<Timestamp>,
    pub review_started_at: Option<Timestamp>,
    pub approved_at: Option<Timestamp>,
    pub rejected_at: Option<Timestamp>,
    pub returned_at: Option<Timestamp>,
    pub approval_opinion: Option<String>,
    pub rejection_reason: Option<String>,
    pub return_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    /// Parse the stored status text.
    pub fn status(&self) -> Result<ProjectStatus, CoreError> {
        ProjectStatus::from_str_db(&self.status)
    }
}

/// DTO for inserting a project. The slug is resolved before insert.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub slug: String,
    pub title: String,
    pub objectives: Option<String>,
    pub justification: Option<String>,
    pub scope: Option<String>,
    pub owner_id: DbId,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub objectives: Option<String>,
    pub justification: Option<String>,
    pub scope: Option<String>,
}

/// Columns written by a lifecycle transition besides `status`.
#[derive(Debug, Clone, Default)]
pub struct TransitionUpdate {
    /// Set `reviewer_id` (taking a project for review).
    pub reviewer_id: Option<DbId>,
    /// Opinion or reason text for review decisions.
    pub decision_text: Option<String>,
}

/// One row of the approval list: a project with its owner and dependency flags.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApprovalListItem {
    pub id: DbId,
    pub slug: String,
    pub title: String,
    pub status: String,
    pub owner_id: DbId,
    pub owner_name: String,
    pub owner_email: String,
    pub reviewer_id: Option<DbId>,
    pub submitted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub has_work_plan: bool,
    pub has_legal_instrument: bool,
    pub fill_status: Option<String>,
}

//! Repository for the `projects` table.

use sqlx::PgPool;
use portal_core::lifecycle::ProjectAction;
use portal_core::project_status::ProjectStatus;
use portal_core::types::DbId;

use super::status_texts;
use crate::models::project::{CreateProject, Project, TransitionUpdate, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, slug, title, objectives, justification, scope, status, owner_id, \
                       reviewer_id, submitted_at, review_started_at, approved_at, rejected_at, \
                       returned_at, approval_opinion, rejection_reason, return_reason, \
                       created_at, updated_at";

/// Extra guard for submissions, checked in the same statement as the status.
const SUBMIT_DEPENDENCIES: &str = "
               AND EXISTS (SELECT 1 FROM legal_instrument_instances
                           WHERE project_id = $1 AND fill_status = 'FILLED')
               AND EXISTS (SELECT 1 FROM work_plans WHERE project_id = $1)";

/// Provides CRUD and lifecycle operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project in DRAFT status, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (slug, title, objectives, justification, scope, owner_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.slug)
            .bind(&input.title)
            .bind(&input.objectives)
            .bind(&input.justification)
            .bind(&input.scope)
            .bind(input.owner_id)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a project by its slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE slug = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List a user's own projects, most recently created first.
    pub async fn list_for_owner(pool: &PgPool, owner_id: DbId) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE owner_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Existing slugs equal to `base` or starting with `base-`.
    ///
    /// Slugs only contain `[a-z0-9-]`, so `base` needs no LIKE escaping.
    pub async fn slugs_with_prefix(pool: &PgPool, base: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT slug FROM projects WHERE slug = $1 OR slug LIKE $2",
        )
        .bind(base)
        .bind(format!("{base}-%"))
        .fetch_all(pool)
        .await
    }

    /// Update project fields while the project is in one of `editable`.
    ///
    /// Returns `None` if the project does not exist or is not editable.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
        editable: &[ProjectStatus],
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                title = COALESCE($2, title),
                objectives = COALESCE($3, objectives),
                justification = COALESCE($4, justification),
                scope = COALESCE($5, scope)
             WHERE id = $1 AND status = ANY($6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.objectives)
            .bind(&input.justification)
            .bind(&input.scope)
            .bind(status_texts(editable))
            .fetch_optional(pool)
            .await
    }

    /// Delete a project only while it is still a draft.
    pub async fn delete_draft(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(ProjectStatus::Draft.as_str())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply a lifecycle transition with a guarded update.
    ///
    /// The row changes only if its status is still one of the action's
    /// allowed predecessors, so a concurrent transition cannot apply twice.
    /// A submit additionally requires a `FILLED` legal instrument instance and
    /// a work plan at the moment of the update. Returns `None` when the guard
    /// did not match.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        action: ProjectAction,
        update: &TransitionUpdate,
    ) -> Result<Option<Project>, sqlx::Error> {
        let extra = match action {
            ProjectAction::Submit => "submitted_at = NOW()",
            ProjectAction::StartReview => "review_started_at = NOW(), reviewer_id = $4",
            ProjectAction::Approve => "approved_at = NOW(), approval_opinion = $4",
            ProjectAction::Reject => "rejected_at = NOW(), rejection_reason = $4",
            ProjectAction::ReturnForAdjustment => "returned_at = NOW(), return_reason = $4",
        };
        let dependencies = match action {
            ProjectAction::Submit => SUBMIT_DEPENDENCIES,
            _ => "",
        };
        let query = format!(
            "UPDATE projects SET status = $2, {extra}
             WHERE id = $1 AND status = ANY($3){dependencies}
             RETURNING {COLUMNS}"
        );
        let q = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(action.target().as_str())
            .bind(status_texts(action.allowed_predecessors()));
        let q = match action {
            ProjectAction::Submit => q,
            ProjectAction::StartReview => q.bind(update.reviewer_id),
            ProjectAction::Approve | ProjectAction::Reject | ProjectAction::ReturnForAdjustment => {
                q.bind(update.decision_text.clone())
            }
        };
        q.fetch_optional(pool).await
    }
}

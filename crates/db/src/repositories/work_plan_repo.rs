//! Repository for the `work_plans` table.

use sqlx::PgPool;
use portal_core::types::DbId;

use crate::models::work_plan::{UpsertWorkPlan, WorkPlan};

const COLUMNS: &str =
    "id, project_id, objectives, methodology, schedule, team, created_at, updated_at";

/// Provides get/upsert for the 1:1 project work plan.
pub struct WorkPlanRepo;

impl WorkPlanRepo {
    /// Find the work plan of a project.
    pub async fn find_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Option<WorkPlan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_plans WHERE project_id = $1");
        sqlx::query_as::<_, WorkPlan>(&query)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a project has a work plan.
    pub async fn exists_for_project(pool: &PgPool, project_id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM work_plans WHERE project_id = $1)",
        )
        .bind(project_id)
        .fetch_one(pool)
        .await
    }

    /// Create or fully replace a project's work plan.
    ///
    /// Missing `schedule` / `team` are stored as empty lists.
    pub async fn upsert(
        pool: &PgPool,
        project_id: DbId,
        input: &UpsertWorkPlan,
    ) -> Result<WorkPlan, sqlx::Error> {
        let query = format!(
            "INSERT INTO work_plans (project_id, objectives, methodology, schedule, team)
             VALUES ($1, $2, $3, COALESCE($4, '[]'::jsonb), COALESCE($5, '[]'::jsonb))
             ON CONFLICT ON CONSTRAINT uq_work_plans_project_id DO UPDATE SET
                objectives = EXCLUDED.objectives,
                methodology = EXCLUDED.methodology,
                schedule = EXCLUDED.schedule,
                team = EXCLUDED.team
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkPlan>(&query)
            .bind(project_id)
            .bind(&input.objectives)
            .bind(&input.methodology)
            .bind(&input.schedule)
            .bind(&input.team)
            .fetch_one(pool)
            .await
    }
}

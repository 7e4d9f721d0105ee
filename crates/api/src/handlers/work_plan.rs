//! Handlers for `/projects/{id}/work-plan`.

use axum::extract::{Path, State};
use axum::Json;
use portal_core::error::CoreError;
use portal_core::types::DbId;
use portal_db::models::work_plan::{UpsertWorkPlan, WorkPlan};
use portal_db::repositories::WorkPlanRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::project::{load_editable, load_viewable};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{id}/work-plan
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<WorkPlan>>> {
    load_viewable(&state, &auth, project_id).await?;
    let plan = WorkPlanRepo::find_by_project(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "WorkPlan",
            id: project_id,
        }))?;
    Ok(Json(DataResponse { data: plan }))
}

/// PUT /api/v1/projects/{id}/work-plan
///
/// Create or replace the work plan while the project is editable.
pub async fn upsert(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<UpsertWorkPlan>,
) -> AppResult<Json<DataResponse<WorkPlan>>> {
    load_editable(&state, &auth, project_id).await?;

    for (name, value) in [("schedule", &input.schedule), ("team", &input.team)] {
        if value.as_ref().is_some_and(|v| !v.is_array()) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "{name}: must be a list"
            ))));
        }
    }

    let plan = WorkPlanRepo::upsert(&state.pool, project_id, &input).await?;
    tracing::debug!(project_id, user_id = auth.user_id, "Work plan saved");
    Ok(Json(DataResponse { data: plan }))
}

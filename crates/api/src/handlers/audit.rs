//! Handler for a project's audit trail.

use axum::extract::{Path, Query, State};
use axum::Json;
use portal_core::error::CoreError;
use portal_core::permissions::AUDIT_VIEW;
use portal_core::types::DbId;
use portal_db::models::audit::AuditLogPage;
use portal_db::repositories::AuditLogRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::project::load_project;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::has_permission;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{id}/audit
///
/// Visible to the project owner and to holders of `audit.view`.
pub async fn list_for_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<AuditLogPage>>> {
    let project = load_project(&state, project_id).await?;
    if project.owner_id != auth.user_id
        && !has_permission(&state, &auth, AUDIT_VIEW, None).await?
    {
        return Err(AppError::Core(CoreError::Forbidden(
            "You are not allowed to view this audit trail".into(),
        )));
    }

    let items =
        AuditLogRepo::list_for_project(&state.pool, project_id, params.limit(), params.offset())
            .await?;
    let total = AuditLogRepo::count_for_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse {
        data: AuditLogPage { items, total },
    }))
}

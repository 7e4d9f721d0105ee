//! Handlers for the `/projects` resource.
//!
//! Owners see and edit their own projects; holders of `project.view_all` or
//! `project.approve` may read any project. Edits are only accepted while the
//! project is DRAFT or RETURNED.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use portal_core::error::CoreError;
use portal_core::permissions::{ResourceScope, PROJECT_APPROVE, PROJECT_CREATE, PROJECT_VIEW_ALL};
use portal_core::project_status::ProjectStatus;
use portal_core::slug::{generate_slug, unique_slug, validate_slug};
use portal_core::types::DbId;
use portal_db::models::audit::CreateAuditLog;
use portal_db::models::project::{CreateProject, Project, UpdateProject};
use portal_db::repositories::ProjectRepo;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{ensure_permission, has_permission};
use crate::notifications::record_audit;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /projects`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 300, message = "must be between 1 and 300 characters"))]
    pub title: String,
    pub objectives: Option<String>,
    pub justification: Option<String>,
    pub scope: Option<String>,
}

/// Request body for `PUT /projects/{id}`. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 300, message = "must be between 1 and 300 characters"))]
    pub title: Option<String>,
    pub objectives: Option<String>,
    pub justification: Option<String>,
    pub scope: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/projects
///
/// Create a DRAFT project owned by the caller. The slug is derived from the
/// title and suffixed (`-2`, `-3`, ...) when already taken.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    input.validate()?;
    ensure_permission(
        &state,
        &auth,
        PROJECT_CREATE,
        None,
        "You are not allowed to create projects",
    )
    .await?;

    let title = input.title.trim().to_string();
    let base = generate_slug(&title);
    let taken = ProjectRepo::slugs_with_prefix(&state.pool, &base).await?;
    let slug = unique_slug(&base, &taken);

    let project = ProjectRepo::create(
        &state.pool,
        &CreateProject {
            slug,
            title,
            objectives: input.objectives,
            justification: input.justification,
            scope: input.scope,
            owner_id: auth.user_id,
        },
    )
    .await?;

    record_audit(
        &state,
        CreateAuditLog {
            project_id: Some(project.id),
            actor_id: Some(auth.user_id),
            action: "project.created".to_string(),
            status_before: None,
            status_after: Some(project.status.clone()),
            details: serde_json::json!({ "slug": project.slug }),
        },
    )
    .await;

    tracing::info!(project_id = project.id, slug = %project.slug, owner_id = auth.user_id, "Project created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
///
/// The caller's own projects, newest first.
pub async fn list_mine(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list_for_owner(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = load_viewable(&state, &auth, id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// GET /api/v1/projects/by-slug/{slug}
pub async fn get_by_slug(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<Project>>> {
    validate_slug(&slug)?;
    let project = ProjectRepo::find_by_slug(&state.pool, &slug)
        .await?
        .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;
    ensure_can_view(&state, &auth, &project).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProjectRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    input.validate()?;
    load_editable(&state, &auth, id).await?;

    let changes = UpdateProject {
        title: input.title.map(|t| t.trim().to_string()),
        objectives: input.objectives,
        justification: input.justification,
        scope: input.scope,
    };
    let project = ProjectRepo::update(&state.pool, id, &changes, &ProjectStatus::EDITABLE)
        .await?
        .ok_or_else(not_editable)?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
///
/// Only DRAFT projects can be deleted. Returns 204 No Content.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let project = load_owned(&state, &auth, id).await?;
    if project.status()? != ProjectStatus::Draft {
        return Err(AppError::Core(CoreError::Precondition(
            "Only draft projects can be deleted".into(),
        )));
    }
    if !ProjectRepo::delete_draft(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::Precondition(
            "Only draft projects can be deleted".into(),
        )));
    }
    tracing::info!(project_id = id, user_id = auth.user_id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Access helpers shared by the project sub-resources
// ---------------------------------------------------------------------------

/// Load a project or fail with 404.
pub(crate) async fn load_project(state: &AppState, id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
}

/// Whether `auth` may read `project`.
pub(crate) async fn can_view(state: &AppState, auth: &AuthUser, project: &Project) -> AppResult<bool> {
    if project.owner_id == auth.user_id {
        return Ok(true);
    }
    if has_permission(state, auth, PROJECT_VIEW_ALL, None).await? {
        return Ok(true);
    }
    has_permission(
        state,
        auth,
        PROJECT_APPROVE,
        Some(ResourceScope::project(project.id)),
    )
    .await
}

async fn ensure_can_view(state: &AppState, auth: &AuthUser, project: &Project) -> AppResult<()> {
    if can_view(state, auth, project).await? {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "You are not allowed to view this project".into(),
        )))
    }
}

/// Load a project the caller may read.
pub(crate) async fn load_viewable(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Project> {
    let project = load_project(state, id).await?;
    ensure_can_view(state, auth, &project).await?;
    Ok(project)
}

/// Load a project owned by the caller.
pub(crate) async fn load_owned(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Project> {
    let project = load_project(state, id).await?;
    if project.owner_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the project owner can change this project".into(),
        )));
    }
    Ok(project)
}

/// Load a project owned by the caller that is still editable.
pub(crate) async fn load_editable(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Project> {
    let project = load_owned(state, auth, id).await?;
    if !project.status()?.is_editable() {
        return Err(not_editable());
    }
    Ok(project)
}

/// Error for a write attempted outside DRAFT / RETURNED.
pub(crate) fn not_editable() -> AppError {
    AppError::Core(CoreError::Precondition(
        "The project can only be changed while it is a draft or returned for adjustment".into(),
    ))
}

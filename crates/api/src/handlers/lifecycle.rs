//! Handlers for project lifecycle transitions.
//!
//! Every transition runs the same pipeline: authorize, load, check the
//! current status and the action's preconditions, apply a guarded status
//! update, then dispatch best-effort side effects.

use axum::extract::{Path, State};
use axum::Json;
use portal_core::error::CoreError;
use portal_core::legal_instrument::FillStatus;
use portal_core::lifecycle::{
    check_submission_dependencies, validate_decision_text, validate_transition, ProjectAction,
    SubmissionDependencies,
};
use portal_core::permissions::{ResourceScope, PROJECT_APPROVE, PROJECT_SUBMIT};
use portal_core::types::DbId;
use portal_db::models::project::{Project, TransitionUpdate};
use portal_db::repositories::{LegalInstrumentInstanceRepo, ProjectRepo, WorkPlanRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::project::load_project;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{ensure_permission, has_permission};
use crate::notifications::{dispatch_lifecycle, LifecycleEvent};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /projects/{id}/approve`.
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub opinion: Option<String>,
}

/// Request body for `POST /projects/{id}/reject` and `/return`.
#[derive(Debug, Deserialize)]
pub struct ReasonRequest {
    pub reason: Option<String>,
}

/// POST /api/v1/projects/{id}/submit
///
/// DRAFT or RETURNED -> PENDING_REVIEW. Requires a FILLED legal instrument
/// and a work plan.
pub async fn submit(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = transition(&state, &auth, id, ProjectAction::Submit, None).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/start-review
///
/// PENDING_REVIEW -> UNDER_REVIEW. The caller becomes the reviewer.
pub async fn start_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = transition(&state, &auth, id, ProjectAction::StartReview, None).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/approve
pub async fn approve(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ApproveRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = transition(&state, &auth, id, ProjectAction::Approve, input.opinion).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/reject
pub async fn reject(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReasonRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = transition(&state, &auth, id, ProjectAction::Reject, input.reason).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/return
pub async fn return_for_adjustment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReasonRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = transition(
        &state,
        &auth,
        id,
        ProjectAction::ReturnForAdjustment,
        input.reason,
    )
    .await?;
    Ok(Json(DataResponse { data: project }))
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

async fn transition(
    state: &AppState,
    auth: &AuthUser,
    id: DbId,
    action: ProjectAction,
    decision_text: Option<String>,
) -> AppResult<Project> {
    let project = load_project(state, id).await?;
    authorize(state, auth, &project, action).await?;

    let from = project.status()?;
    validate_transition(action, from)?;
    let text = validate_decision_text(action, decision_text.as_deref())?;

    if action == ProjectAction::Submit {
        check_submission_dependencies(load_dependencies(state, id).await?)?;
    }

    let update = TransitionUpdate {
        reviewer_id: (action == ProjectAction::StartReview).then_some(auth.user_id),
        decision_text: action.requires_decision_text().then(|| text.clone()),
    };

    let Some(updated) = ProjectRepo::transition(&state.pool, id, action, &update).await? else {
        // Another request moved the project first.
        let current = load_project(state, id).await?.status()?;
        validate_transition(action, current)?;
        if action == ProjectAction::Submit {
            check_submission_dependencies(load_dependencies(state, id).await?)?;
        }
        return Err(AppError::Core(CoreError::Conflict(
            "The project changed while this request was processed; please retry".into(),
        )));
    };

    tracing::info!(
        project_id = id,
        actor_id = auth.user_id,
        from = %from,
        to = %action.target(),
        "Project status changed"
    );

    dispatch_lifecycle(
        state,
        &LifecycleEvent {
            action,
            project: &updated,
            actor_id: auth.user_id,
            from,
            decision_text: action.requires_decision_text().then_some(text.as_str()),
        },
    )
    .await;

    Ok(updated)
}

async fn authorize(
    state: &AppState,
    auth: &AuthUser,
    project: &Project,
    action: ProjectAction,
) -> AppResult<()> {
    let scope = Some(ResourceScope::project(project.id));
    match action {
        ProjectAction::Submit => {
            if project.owner_id == auth.user_id
                || has_permission(state, auth, PROJECT_SUBMIT, scope).await?
            {
                Ok(())
            } else {
                Err(AppError::Core(CoreError::Forbidden(
                    "Only the project owner can submit this project".into(),
                )))
            }
        }
        _ => {
            ensure_permission(
                state,
                auth,
                PROJECT_APPROVE,
                scope,
                "You are not allowed to review projects",
            )
            .await
        }
    }
}

async fn load_dependencies(state: &AppState, id: DbId) -> AppResult<SubmissionDependencies> {
    let legal_instrument = LegalInstrumentInstanceRepo::fill_status_for_project(&state.pool, id)
        .await?
        .map(|s| FillStatus::from_str_db(&s))
        .transpose()?;
    let has_work_plan = WorkPlanRepo::exists_for_project(&state.pool, id).await?;
    Ok(SubmissionDependencies {
        legal_instrument,
        has_work_plan,
    })
}

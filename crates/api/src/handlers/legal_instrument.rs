//! Handlers for the legal instrument catalog and per-project instances.
//!
//! The catalog (`/legal-instruments`) is readable by any authenticated
//! user and writable with `legal_instrument.manage`. A project's instance
//! (`/projects/{id}/legal-instrument`) pins one version snapshot and holds
//! the answers the owner fills in.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use portal_core::error::CoreError;
use portal_core::legal_instrument::{
    derive_fill_status, missing_required_fields, render_template, validate_answer_keys,
    validate_field_specs, Answers, FieldSpec, InstrumentType,
};
use portal_core::permissions::LEGAL_INSTRUMENT_MANAGE;
use portal_core::project_status::ProjectStatus;
use portal_core::types::DbId;
use portal_db::models::audit::CreateAuditLog;
use portal_db::models::legal_instrument::{
    CreateLegalInstrument, LegalInstrument, LegalInstrumentInstance, LegalInstrumentVersion,
    UpdateLegalInstrument,
};
use portal_db::repositories::{
    AttachOutcome, LegalInstrumentInstanceRepo, LegalInstrumentRepo, LegalInstrumentVersionRepo,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::project::{load_editable, load_viewable, not_editable};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{ensure_permission, ManageLegalInstruments, RequirePermission};
use crate::notifications::record_audit;
use crate::query::IncludeInactiveParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /legal-instruments`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLegalInstrumentRequest {
    pub instrument_type: String,
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub field_spec: Vec<FieldSpec>,
    #[serde(default)]
    pub template_body: String,
    pub template_file_key: Option<String>,
}

/// Request body for `PUT /legal-instruments/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLegalInstrumentRequest {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub field_spec: Option<Vec<FieldSpec>>,
    pub template_body: Option<String>,
    pub template_file_key: Option<String>,
    pub is_active: Option<bool>,
}

/// Request body for `POST /projects/{id}/legal-instrument`.
#[derive(Debug, Deserialize)]
pub struct AttachRequest {
    pub legal_instrument_id: DbId,
}

/// Request body for the fill and autosave endpoints.
#[derive(Debug, Deserialize)]
pub struct AnswersRequest {
    pub answers: Answers,
}

/// A project's instance together with the version it is pinned to.
#[derive(Debug, Serialize)]
pub struct InstanceView {
    pub instance: LegalInstrumentInstance,
    pub version: LegalInstrumentVersion,
    pub legal_instrument: LegalInstrument,
    /// Required field ids still without an answer.
    pub missing_required_fields: Vec<String>,
}

/// Rendered template preview.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub rendered: String,
    pub fill_status: String,
    pub missing_required_fields: Vec<String>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// GET /api/v1/legal-instruments
///
/// Active instruments for everyone; `?include_inactive=true` requires
/// `legal_instrument.manage`.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<Json<DataResponse<Vec<LegalInstrument>>>> {
    if params.include_inactive {
        ensure_permission(
            &state,
            &auth,
            LEGAL_INSTRUMENT_MANAGE,
            None,
            "You are not allowed to list inactive legal instruments",
        )
        .await?;
    }
    let items = LegalInstrumentRepo::list(&state.pool, params.include_inactive).await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/legal-instruments/{id}
pub async fn get_by_id(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<LegalInstrument>>> {
    let instrument = load_instrument(&state, id).await?;
    Ok(Json(DataResponse { data: instrument }))
}

/// POST /api/v1/legal-instruments
pub async fn create(
    perm: RequirePermission<ManageLegalInstruments>,
    State(state): State<AppState>,
    Json(input): Json<CreateLegalInstrumentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<LegalInstrument>>)> {
    input.validate()?;
    let instrument_type = InstrumentType::from_str_db(&input.instrument_type)?;
    validate_field_specs(&input.field_spec)?;

    let instrument = LegalInstrumentRepo::create(
        &state.pool,
        &CreateLegalInstrument {
            instrument_type: instrument_type.as_str().to_string(),
            name: input.name.trim().to_string(),
            description: input.description,
            field_spec: input.field_spec,
            template_body: input.template_body,
            template_file_key: input.template_file_key,
        },
    )
    .await?;

    tracing::info!(
        legal_instrument_id = instrument.id,
        instrument_type = %instrument.instrument_type,
        user_id = perm.user.user_id,
        "Legal instrument created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: instrument })))
}

/// PUT /api/v1/legal-instruments/{id}
///
/// Changing the field spec or any template content bumps `current_version`.
/// Projects keep the snapshot they were attached to.
pub async fn update(
    perm: RequirePermission<ManageLegalInstruments>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateLegalInstrumentRequest>,
) -> AppResult<Json<DataResponse<LegalInstrument>>> {
    input.validate()?;
    if let Some(ref fields) = input.field_spec {
        validate_field_specs(fields)?;
    }

    let changes = UpdateLegalInstrument {
        name: input.name.map(|n| n.trim().to_string()),
        description: input.description,
        field_spec: input.field_spec,
        template_body: input.template_body,
        template_file_key: input.template_file_key,
        is_active: input.is_active,
    };
    let instrument = LegalInstrumentRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "LegalInstrument",
            id,
        }))?;

    tracing::info!(
        legal_instrument_id = id,
        version = instrument.current_version,
        user_id = perm.user.user_id,
        "Legal instrument updated"
    );
    Ok(Json(DataResponse { data: instrument }))
}

/// GET /api/v1/legal-instruments/{id}/versions
pub async fn list_versions(
    _perm: RequirePermission<ManageLegalInstruments>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<LegalInstrumentVersion>>>> {
    load_instrument(&state, id).await?;
    let versions = LegalInstrumentVersionRepo::list_for_instrument(&state.pool, id).await?;
    Ok(Json(DataResponse { data: versions }))
}

// ---------------------------------------------------------------------------
// Per-project instance
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}/legal-instrument
pub async fn get_instance(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<InstanceView>>> {
    load_viewable(&state, &auth, project_id).await?;
    let instance = load_instance(&state, project_id).await?;
    let view = instance_view(&state, instance).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/projects/{id}/legal-instrument
///
/// Attach the current version of a catalog entry. Re-attaching after the
/// entry got a new version repoints the instance and clears its answers.
pub async fn attach(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<AttachRequest>,
) -> AppResult<Json<DataResponse<InstanceView>>> {
    load_editable(&state, &auth, project_id).await?;

    let outcome = LegalInstrumentInstanceRepo::attach(
        &state.pool,
        project_id,
        input.legal_instrument_id,
        &ProjectStatus::EDITABLE,
    )
    .await?;
    let instance = match outcome {
        AttachOutcome::Attached(instance) => instance,
        AttachOutcome::ProjectNotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Project",
                id: project_id,
            }))
        }
        AttachOutcome::ProjectNotEditable => return Err(not_editable()),
        AttachOutcome::InstrumentUnavailable => {
            return Err(AppError::Core(CoreError::Precondition(
                "The selected legal instrument is not available".into(),
            )))
        }
    };

    record_audit(
        &state,
        CreateAuditLog {
            project_id: Some(project_id),
            actor_id: Some(auth.user_id),
            action: "legal_instrument.attached".to_string(),
            status_before: None,
            status_after: None,
            details: serde_json::json!({
                "legal_instrument_id": input.legal_instrument_id,
                "version_id": instance.version_id,
            }),
        },
    )
    .await;

    tracing::info!(
        project_id,
        legal_instrument_id = input.legal_instrument_id,
        version_id = instance.version_id,
        "Legal instrument attached"
    );
    let view = instance_view(&state, instance).await?;
    Ok(Json(DataResponse { data: view }))
}

/// PUT /api/v1/projects/{id}/legal-instrument/fill
///
/// Replace the answer map and store the derived fill status.
pub async fn fill(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<AnswersRequest>,
) -> AppResult<Json<DataResponse<InstanceView>>> {
    load_editable(&state, &auth, project_id).await?;
    let instance = load_instance(&state, project_id).await?;
    let version = load_version(&state, instance.version_id).await?;

    validate_answer_keys(&version.field_spec, &input.answers)?;
    let fill_status = derive_fill_status(&version.field_spec, &input.answers);

    let instance = LegalInstrumentInstanceRepo::replace_answers(
        &state.pool,
        instance.id,
        &input.answers,
        fill_status,
        &ProjectStatus::EDITABLE,
    )
    .await?
    .ok_or_else(not_editable)?;

    tracing::debug!(project_id, fill_status = fill_status.as_str(), "Legal instrument filled");
    let view = instance_view(&state, instance).await?;
    Ok(Json(DataResponse { data: view }))
}

/// PATCH /api/v1/projects/{id}/legal-instrument/fill
///
/// Autosave: merge the given keys into the stored answers.
pub async fn autosave(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<AnswersRequest>,
) -> AppResult<Json<DataResponse<InstanceView>>> {
    load_editable(&state, &auth, project_id).await?;
    let instance = load_instance(&state, project_id).await?;
    let version = load_version(&state, instance.version_id).await?;

    validate_answer_keys(&version.field_spec, &input.answers)?;

    let instance = LegalInstrumentInstanceRepo::merge_answers(
        &state.pool,
        instance.id,
        &input.answers,
        &version.field_spec,
        &ProjectStatus::EDITABLE,
    )
    .await?
    .ok_or_else(not_editable)?;

    let view = instance_view(&state, instance).await?;
    Ok(Json(DataResponse { data: view }))
}

/// GET /api/v1/projects/{id}/legal-instrument/preview
///
/// Render the pinned version's template with the current answers.
pub async fn preview(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<PreviewResponse>>> {
    load_viewable(&state, &auth, project_id).await?;
    let instance = load_instance(&state, project_id).await?;
    let version = load_version(&state, instance.version_id).await?;

    let rendered = render_template(&version.template_body, &version.field_spec, &instance.answers);
    let missing = missing_required_fields(&version.field_spec, &instance.answers)
        .into_iter()
        .map(str::to_string)
        .collect();

    Ok(Json(DataResponse {
        data: PreviewResponse {
            rendered,
            fill_status: instance.fill_status.clone(),
            missing_required_fields: missing,
        },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_instrument(state: &AppState, id: DbId) -> AppResult<LegalInstrument> {
    LegalInstrumentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "LegalInstrument",
            id,
        }))
}

async fn load_instance(state: &AppState, project_id: DbId) -> AppResult<LegalInstrumentInstance> {
    LegalInstrumentInstanceRepo::find_by_project(&state.pool, project_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Precondition(
                "No legal instrument is attached to this project".into(),
            ))
        })
}

async fn load_version(state: &AppState, version_id: DbId) -> AppResult<LegalInstrumentVersion> {
    LegalInstrumentVersionRepo::find_by_id(&state.pool, version_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "LegalInstrumentVersion",
            id: version_id,
        }))
}

async fn instance_view(state: &AppState, instance: LegalInstrumentInstance) -> AppResult<InstanceView> {
    let version = load_version(state, instance.version_id).await?;
    let legal_instrument = load_instrument(state, version.legal_instrument_id).await?;
    let missing_required_fields = missing_required_fields(&version.field_spec, &instance.answers)
        .into_iter()
        .map(str::to_string)
        .collect();
    Ok(InstanceView {
        instance,
        version,
        legal_instrument,
        missing_required_fields,
    })
}

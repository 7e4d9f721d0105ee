//! Handlers for the `/me` resource: the caller's own profile.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use portal_core::error::CoreError;
use portal_core::otp::{normalize_email, OtpPurpose};
use portal_db::models::user::UserResponse;
use portal_db::repositories::UserRepo;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::auth::{issue_code, redeem_code, OtpIssued};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /me`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub name: String,
}

/// Request body for `POST /me/email-change/request`.
#[derive(Debug, Deserialize, Validate)]
pub struct EmailChangeRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub new_email: String,
}

/// Request body for `POST /me/email-change/confirm`.
#[derive(Debug, Deserialize, Validate)]
pub struct EmailChangeConfirm {
    #[validate(email(message = "must be a valid email address"))]
    pub new_email: String,
    pub code: String,
}

/// GET /api/v1/me
pub async fn get_profile(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = load_profile(&state, &auth).await?;
    Ok(Json(DataResponse { data: user }))
}

/// PUT /api/v1/me
pub async fn update_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    input.validate()?;
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "name: must not be blank".into(),
        )));
    }

    UserRepo::rename(&state.pool, auth.user_id, name).await?;

    let user = load_profile(&state, &auth).await?;
    Ok(Json(DataResponse { data: user }))
}

/// POST /api/v1/me/email-change/request
///
/// Email a confirmation code to the new address. Returns 202 Accepted.
pub async fn request_email_change(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<EmailChangeRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<OtpIssued>>)> {
    input.validate()?;
    let new_email = normalize_email(&input.new_email);

    if UserRepo::find_by_email(&state.pool, &new_email)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(
            "Email address is already in use".into(),
        )));
    }

    let issued = issue_code(&state, &new_email, OtpPurpose::EmailChange, Some(auth.user_id)).await?;
    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: issued })))
}

/// POST /api/v1/me/email-change/confirm
///
/// Redeem the code sent to the new address and switch the account to it.
pub async fn confirm_email_change(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<EmailChangeConfirm>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    input.validate()?;
    let new_email = normalize_email(&input.new_email);

    let otp = redeem_code(&state, &new_email, OtpPurpose::EmailChange, &input.code).await?;
    if otp.user_id != Some(auth.user_id) {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid or expired code".into(),
        )));
    }

    UserRepo::change_email(&state.pool, auth.user_id, &new_email).await?;
    tracing::info!(user_id = auth.user_id, "Email address changed");

    let user = load_profile(&state, &auth).await?;
    Ok(Json(DataResponse { data: user }))
}

async fn load_profile(state: &AppState, auth: &AuthUser) -> AppResult<UserResponse> {
    UserRepo::find_response_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))
}

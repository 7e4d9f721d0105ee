//! Handlers for the `/auth` resource (OTP login, refresh, logout).
//!
//! Login is passwordless: the client requests a 6-digit code for an email
//! address and exchanges it for an access + refresh token pair. The first
//! successful login creates the user with the default role.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use portal_core::error::CoreError;
use portal_core::otp::{
    check_resend_allowed, display_name_from_email, generate_code, is_email_domain_allowed,
    normalize_email, validate_code_format, OtpPurpose, MAX_ATTEMPTS,
};
use portal_core::roles::DEFAULT_ROLE;
use portal_core::types::DbId;
use portal_db::models::otp::{CreateEmailOtp, EmailOtp};
use portal_db::models::session::CreateSession;
use portal_db::models::user::{CreateUser, User, UserResponse};
use portal_db::repositories::{OtpRepo, RoleRepo, SessionRepo, UserRepo};
use portal_events::messages::otp_email;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::otp::{hash_code, verify_code};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const INVALID_CODE: &str = "Invalid or expired code";
const INVALID_REFRESH: &str = "Invalid or expired refresh token";

/// Request body for `POST /auth/otp/request`.
#[derive(Debug, Deserialize, Validate)]
pub struct OtpRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

/// Request body for `POST /auth/otp/verify`.
#[derive(Debug, Deserialize, Validate)]
pub struct OtpVerifyRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Returned when a code has been issued.
#[derive(Debug, Serialize)]
pub struct OtpIssued {
    /// Code lifetime in seconds.
    pub expires_in: i64,
    /// Seconds before another code may be requested.
    pub resend_after: i64,
}

/// Successful authentication response returned by verify and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// POST /api/v1/auth/otp/request
///
/// Email a login code. Returns 202 Accepted.
pub async fn request_otp(
    State(state): State<AppState>,
    Json(input): Json<OtpRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<OtpIssued>>)> {
    input.validate()?;
    let email = normalize_email(&input.email);

    let user_id = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .map(|u| u.id);
    let issued = issue_code(&state, &email, OtpPurpose::Login, user_id).await?;

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: issued })))
}

/// POST /api/v1/auth/otp/verify
///
/// Exchange a login code for tokens, creating the user on first login.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(input): Json<OtpVerifyRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    input.validate()?;
    let email = normalize_email(&input.email);

    redeem_code(&state, &email, OtpPurpose::Login, &input.code).await?;

    let user = match UserRepo::find_by_email(&state.pool, &email).await? {
        Some(user) => user,
        None => {
            let role = RoleRepo::find_by_name(&state.pool, DEFAULT_ROLE)
                .await?
                .ok_or_else(|| {
                    AppError::InternalError(format!("Default role '{DEFAULT_ROLE}' is missing"))
                })?;
            let user = UserRepo::create(
                &state.pool,
                &CreateUser {
                    email: email.clone(),
                    name: display_name_from_email(&email),
                    role_id: role.id,
                },
            )
            .await?;
            tracing::info!(user_id = user.id, "User created on first login");
            user
        }
    };

    ensure_active(&user)?;

    UserRepo::record_login(&state.pool, user.id).await?;
    let data = start_session(&state, user.id).await?;

    tracing::info!(user_id = user.id, "Signed in with email code");
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/auth/refresh
///
/// Rotates the session: the presented token is revoked before a new pair
/// is issued, so replaying it fails.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    let digest = hash_refresh_token(&input.refresh_token);
    let rejected = || AppError::Core(CoreError::Unauthorized(INVALID_REFRESH.into()));

    let session = SessionRepo::find_active_by_hash(&state.pool, &digest)
        .await?
        .ok_or_else(rejected)?;
    if !SessionRepo::revoke(&state.pool, session.id).await? {
        return Err(rejected());
    }

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(rejected)?;
    ensure_active(&user)?;

    let data = start_session(&state, user.id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/auth/logout
///
/// Ends every session of the caller, not only the current one.
pub async fn logout(auth: AuthUser, State(state): State<AppState>) -> AppResult<StatusCode> {
    let ended = SessionRepo::revoke_all_for_user(&state.pool, auth.user_id).await?;
    tracing::info!(user_id = auth.user_id, ended, "Sessions revoked on logout");
    Ok(StatusCode::NO_CONTENT)
}

/// Generate, store and email a code for `email`.
///
/// Enforces the domain allow-list and the resend interval.
pub(crate) async fn issue_code(
    state: &AppState,
    email: &str,
    purpose: OtpPurpose,
    user_id: Option<DbId>,
) -> AppResult<OtpIssued> {
    let otp_config = &state.config.otp;
    if !is_email_domain_allowed(email, &otp_config.allowed_email_domains) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Email domain is not allowed".into(),
        )));
    }

    let last = OtpRepo::last_issued_at(&state.pool, email, purpose.as_str()).await?;
    check_resend_allowed(last, Utc::now(), otp_config.resend_interval_secs)?;

    let code = generate_code();
    let code_hash =
        hash_code(&code).map_err(|e| AppError::InternalError(format!("Code hashing error: {e}")))?;

    OtpRepo::create(
        &state.pool,
        &CreateEmailOtp {
            email: email.to_string(),
            purpose: purpose.as_str().to_string(),
            user_id,
            code_hash,
            expires_at: Utc::now() + Duration::minutes(otp_config.expiry_mins),
        },
    )
    .await?;

    let message = otp_email(email, &code, purpose, otp_config.expiry_mins);
    if let Err(e) = state.mailer.send(&message).await {
        tracing::warn!(error = %e, purpose = purpose.as_str(), "Failed to send code email");
    }

    Ok(OtpIssued {
        expires_in: otp_config.expiry_mins * 60,
        resend_after: otp_config.resend_interval_secs,
    })
}

/// Check `code` against the newest live code for `email` and consume it.
///
/// Every mismatch counts as an attempt; a code is dead after
/// [`MAX_ATTEMPTS`] failures.
pub(crate) async fn redeem_code(
    state: &AppState,
    email: &str,
    purpose: OtpPurpose,
    code: &str,
) -> AppResult<EmailOtp> {
    validate_code_format(code)?;

    let otp = OtpRepo::find_live(&state.pool, email, purpose.as_str())
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized(INVALID_CODE.into())))?;

    if otp.attempts >= MAX_ATTEMPTS {
        return Err(AppError::Core(CoreError::RateLimited(
            "Too many attempts. Request a new code".into(),
        )));
    }

    let matches = verify_code(code, &otp.code_hash)
        .map_err(|e| AppError::InternalError(format!("Code verification error: {e}")))?;
    if !matches {
        let attempts = OtpRepo::record_failed_attempt(&state.pool, otp.id).await?;
        tracing::debug!(otp_id = otp.id, attempts, "Wrong code");
        return Err(AppError::Core(CoreError::Unauthorized(INVALID_CODE.into())));
    }

    if !OtpRepo::consume(&state.pool, otp.id).await? {
        return Err(AppError::Core(CoreError::Unauthorized(INVALID_CODE.into())));
    }
    Ok(otp)
}

fn ensure_active(user: &User) -> AppResult<()> {
    if user.is_active {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Account is deactivated".into()).into())
    }
}

/// Opens a session row for `user_id` and returns the new token pair.
async fn start_session(state: &AppState, user_id: DbId) -> AppResult<AuthResponse> {
    let jwt = &state.config.jwt;
    let user = UserRepo::find_response_by_id(&state.pool, user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: user_id,
        })?;

    let access_token = generate_access_token(user.id, &user.role, jwt)
        .map_err(|e| AppError::InternalError(format!("Failed to sign access token: {e}")))?;

    let (refresh_token, refresh_token_hash) = generate_refresh_token();
    SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id,
            refresh_token_hash,
            expires_at: Utc::now() + Duration::days(jwt.refresh_token_expiry_days),
        },
    )
    .await?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        expires_in: jwt.access_token_expiry_mins * 60,
        user,
    })
}

//! Route definitions for the `/auth` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /otp/request  -> request_otp
/// POST /otp/verify   -> verify_otp
/// POST /refresh      -> refresh
/// POST /logout       -> logout (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/otp/request", post(auth::request_otp))
        .route("/otp/verify", post(auth::verify_otp))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
}

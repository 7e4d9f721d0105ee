//! Route definitions for the `/me` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::me;
use crate::state::AppState;

/// Routes mounted at `/me`.
///
/// ```text
/// GET  /                        -> get_profile
/// PUT  /                        -> update_profile
/// POST /email-change/request    -> request_email_change
/// POST /email-change/confirm    -> confirm_email_change
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(me::get_profile).put(me::update_profile))
        .route("/email-change/request", post(me::request_email_change))
        .route("/email-change/confirm", post(me::confirm_email_change))
}

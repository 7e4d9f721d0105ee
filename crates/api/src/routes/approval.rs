//! Route definitions for the `/approvals` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::approval;
use crate::state::AppState;

/// Routes mounted at `/approvals`.
///
/// ```text
/// GET /   -> list (requires project.view_all)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(approval::list))
}

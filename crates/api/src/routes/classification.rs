//! Route definitions for the `/classification` wizard.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::classification;
use crate::state::AppState;

/// Routes mounted at `/classification`.
///
/// ```text
/// GET  /         -> graph
/// POST /replay   -> replay
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(classification::graph))
        .route("/replay", post(classification::replay))
}

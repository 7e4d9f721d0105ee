//! Route definitions for the `/legal-instruments` catalog.

use axum::routing::get;
use axum::Router;

use crate::handlers::legal_instrument;
use crate::state::AppState;

/// Routes mounted at `/legal-instruments`.
///
/// ```text
/// GET  /                 -> list
/// POST /                 -> create (legal_instrument.manage)
/// GET  /{id}             -> get_by_id
/// PUT  /{id}             -> update (legal_instrument.manage)
/// GET  /{id}/versions    -> list_versions (legal_instrument.manage)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(legal_instrument::list).post(legal_instrument::create))
        .route(
            "/{id}",
            get(legal_instrument::get_by_id).put(legal_instrument::update),
        )
        .route("/{id}/versions", get(legal_instrument::list_versions))
}

//! Route definitions for the `/projects` resource and its sub-resources.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{audit, legal_instrument, lifecycle, project, work_plan};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                                -> list_mine
/// POST   /                                -> create
/// GET    /by-slug/{slug}                  -> get_by_slug
/// GET    /{id}                            -> get_by_id
/// PUT    /{id}                            -> update
/// DELETE /{id}                            -> delete
///
/// POST   /{id}/submit                     -> lifecycle::submit
/// POST   /{id}/start-review               -> lifecycle::start_review
/// POST   /{id}/approve                    -> lifecycle::approve
/// POST   /{id}/reject                     -> lifecycle::reject
/// POST   /{id}/return                     -> lifecycle::return_for_adjustment
///
/// GET    /{id}/work-plan                  -> work_plan::get
/// PUT    /{id}/work-plan                  -> work_plan::upsert
///
/// GET    /{id}/legal-instrument           -> legal_instrument::get_instance
/// POST   /{id}/legal-instrument           -> legal_instrument::attach
/// PUT    /{id}/legal-instrument/fill      -> legal_instrument::fill
/// PATCH  /{id}/legal-instrument/fill      -> legal_instrument::autosave
/// GET    /{id}/legal-instrument/preview   -> legal_instrument::preview
///
/// GET    /{id}/audit                      -> audit::list_for_project
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list_mine).post(project::create))
        .route("/by-slug/{slug}", get(project::get_by_slug))
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .delete(project::delete),
        )
        // Lifecycle
        .route("/{id}/submit", post(lifecycle::submit))
        .route("/{id}/start-review", post(lifecycle::start_review))
        .route("/{id}/approve", post(lifecycle::approve))
        .route("/{id}/reject", post(lifecycle::reject))
        .route("/{id}/return", post(lifecycle::return_for_adjustment))
        // Dependencies
        .route("/{id}/work-plan", get(work_plan::get).put(work_plan::upsert))
        .route(
            "/{id}/legal-instrument",
            get(legal_instrument::get_instance).post(legal_instrument::attach),
        )
        .route(
            "/{id}/legal-instrument/fill",
            put(legal_instrument::fill).patch(legal_instrument::autosave),
        )
        .route(
            "/{id}/legal-instrument/preview",
            get(legal_instrument::preview),
        )
        .route("/{id}/audit", get(audit::list_for_project))
}

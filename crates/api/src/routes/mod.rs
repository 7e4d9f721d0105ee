pub mod approval;
pub mod auth;
pub mod classification;
pub mod health;
pub mod legal_instrument;
pub mod me;
pub mod notification;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/otp/request                                 request a login code (public)
/// /auth/otp/verify                                  exchange a code for tokens (public)
/// /auth/refresh                                     rotate tokens (public)
/// /auth/logout                                      revoke sessions
///
/// /me                                               get, update own profile
/// /me/email-change/request                          email a code to the new address
/// /me/email-change/confirm                          switch to the new address
///
/// /projects                                         list own, create
/// /projects/by-slug/{slug}                          get by slug
/// /projects/{id}                                    get, update, delete
/// /projects/{id}/submit|start-review|approve|reject|return
/// /projects/{id}/work-plan                          get, upsert
/// /projects/{id}/legal-instrument                   get, attach
/// /projects/{id}/legal-instrument/fill              fill (PUT), autosave (PATCH)
/// /projects/{id}/legal-instrument/preview           render template
/// /projects/{id}/audit                              audit trail
///
/// /approvals                                        approval list
///
/// /legal-instruments                                list, create
/// /legal-instruments/{id}                           get, update
/// /legal-instruments/{id}/versions                  version snapshots
///
/// /classification                                   question graph
/// /classification/replay                            replay answers
///
/// /notifications                                    list
/// /notifications/unread-count                       unread count
/// /notifications/read-all                           mark all read
/// /notifications/{id}/read                          mark one read
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/me", me::router())
        .nest("/projects", project::router())
        .nest("/approvals", approval::router())
        .nest("/legal-instruments", legal_instrument::router())
        .nest("/classification", classification::router())
        .nest("/notifications", notification::router())
}

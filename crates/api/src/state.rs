use std::sync::Arc;

use portal_events::Mailer;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: portal_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Outgoing email delivery (SMTP, log-only, or in-memory in tests).
    pub mailer: Arc<dyn Mailer>,
}

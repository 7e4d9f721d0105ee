use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use portal_core::error::CoreError;
use serde::Serialize;

const UNIQUE_VIOLATION: &str = "23505";
const SERIALIZATION_FAILURE: &str = "40001";

const HIDDEN_MESSAGE: &str = "An internal error occurred";

/// Error returned by every handler.
///
/// Domain failures arrive as [`CoreError`]; the rest are transport or
/// storage problems. All of them render as `{"error": ..., "code": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl ErrorBody {
    fn new(code: &'static str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }

    /// Logs the real cause and hides it from the client.
    fn hidden(cause: &dyn std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "Request failed with an internal error");
        Self::new("INTERNAL_ERROR", HIDDEN_MESSAGE)
    }
}

/// Flattens field errors into `field: message; field: message`, sorted by field.
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut parts: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, field_errors)| {
                let message = field_errors
                    .iter()
                    .find_map(|e| e.message.as_deref())
                    .unwrap_or("is invalid");
                format!("{field}: {message}")
            })
            .collect();
        parts.sort();
        CoreError::Validation(parts.join("; ")).into()
    }
}

fn render_core(err: &CoreError) -> (StatusCode, ErrorBody) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            ErrorBody::new("NOT_FOUND", format!("{entity} with id {id} not found")),
        ),
        CoreError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("VALIDATION_ERROR", msg.as_str()),
        ),
        CoreError::Precondition(msg) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorBody::new("PRECONDITION_FAILED", msg.as_str()),
        ),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, ErrorBody::new("CONFLICT", msg.as_str())),
        CoreError::Unauthorized(msg) => (
            StatusCode::UNAUTHORIZED,
            ErrorBody::new("UNAUTHORIZED", msg.as_str()),
        ),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorBody::new("FORBIDDEN", msg.as_str())),
        CoreError::RateLimited(msg) => (
            StatusCode::TOO_MANY_REQUESTS,
            ErrorBody::new("RATE_LIMITED", msg.as_str()),
        ),
        CoreError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::hidden(msg)),
    }
}

/// `RowNotFound` is a 404. Violations of the named `uq_*` constraints and
/// serialization failures are 409s. Anything else is a hidden 500.
fn render_sqlx(err: &sqlx::Error) -> (StatusCode, ErrorBody) {
    if let sqlx::Error::RowNotFound = err {
        return (
            StatusCode::NOT_FOUND,
            ErrorBody::new("NOT_FOUND", "Resource not found"),
        );
    }

    if let Some(db_err) = err.as_database_error() {
        let constraint = db_err.constraint().filter(|c| c.starts_with("uq_"));
        match (db_err.code().as_deref(), constraint) {
            (Some(UNIQUE_VIOLATION), Some(constraint)) => {
                return (
                    StatusCode::CONFLICT,
                    ErrorBody::new(
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    ),
                );
            }
            (Some(SERIALIZATION_FAILURE), _) => {
                return (
                    StatusCode::CONFLICT,
                    ErrorBody::new(
                        "CONFLICT",
                        "A concurrent change conflicted with this request; please retry",
                    ),
                );
            }
            _ => {}
        }
    }

    (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::hidden(err))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Core(err) => render_core(err),
            AppError::Database(err) => render_sqlx(err),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("BAD_REQUEST", msg.as_str()),
            ),
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::hidden(msg)),
        };
        (status, Json(body)).into_response()
    }
}

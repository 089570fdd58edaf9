use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use herald_core::error::CoreError;
use herald_db::StoreError;
use herald_events::ServiceError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`ServiceError`] for
/// notification lifecycle failures. Implements [`IntoResponse`] to produce
/// consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `herald_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failure reported by the notification service.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Service(err) => match err {
                ServiceError::Core(core) => classify_core_error(core),
                ServiceError::NotFound { id, .. } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Notification with id {id} not found"),
                ),
                ServiceError::Store {
                    source: StoreError::AlreadyExists { id },
                    ..
                } => (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Notification {id} already exists"),
                ),
                ServiceError::Store {
                    source: StoreError::InvalidTransition { id },
                    ..
                } => (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Notification {id} cannot change to the requested status"),
                ),
                ServiceError::Store { .. } => {
                    tracing::error!(error = %err, "Notification store error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
    }
}

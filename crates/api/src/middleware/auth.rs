//! Caller identity extractor for Axum handlers.
//!
//! Authentication happens upstream (gateway or reverse proxy); by the time a
//! request reaches this server the caller's id is carried in the
//! [`USER_ID_HEADER`] header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use herald_core::error::CoreError;
use herald_core::types::RecipientId;

use crate::error::AppError;

/// Header that carries the authenticated caller's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller on whose behalf the request runs.
///
/// Use this as an extractor parameter in any handler scoped to one
/// recipient's notifications:
///
/// ```ignore
/// async fn my_handler(user: CurrentUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: RecipientId,
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(format!(
                    "Missing {USER_ID_HEADER} header"
                )))
            })?;

        Ok(CurrentUser {
            user_id: user_id.to_string(),
        })
    }
}

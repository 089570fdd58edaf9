//! Handlers for the `/notifications` resource.
//!
//! Read and update endpoints act on the caller's own notifications, resolved
//! via [`CurrentUser`]. Another recipient's notification is reported as not
//! found rather than forbidden so ids cannot be probed.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use herald_core::error::CoreError;
use herald_core::notification::{CreateNotification, Notification};
use herald_core::types::NotificationId;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentUser;
use crate::response::{data, DataResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Maximum page size for notification listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for notification listing.
const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub marked_read: u64,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a notification, treating one addressed to someone else as missing.
async fn find_owned(
    state: &AppState,
    user: &CurrentUser,
    id: NotificationId,
) -> AppResult<Notification> {
    let notification = state.notifications.get_by_id(id).await?;
    if notification.recipient_id != user.user_id {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id: id.to_string(),
        }));
    }
    Ok(notification)
}

// ---------------------------------------------------------------------------
// Notification CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications
///
/// List the caller's notifications, newest first.
pub async fn list_notifications(
    user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<DataResponse<Vec<Notification>>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let offset = params.offset.unwrap_or(0);
    if limit < 1 || offset < 0 {
        return Err(AppError::BadRequest(
            "limit must be positive and offset must not be negative".into(),
        ));
    }
    let limit = limit.min(MAX_LIMIT);

    let notifications = if params.unread_only.unwrap_or(false) {
        state
            .notifications
            .get_unread_by_user_id(&user.user_id, limit, offset)
            .await?
    } else {
        state
            .notifications
            .get_by_user_id(&user.user_id, limit, offset)
            .await?
    };

    Ok(data(notifications))
}

/// POST /api/v1/notifications
///
/// Producer endpoint: persist a notification and push it to the
/// recipient's live sessions. Returns 201 with the stored record.
pub async fn create_notification(
    State(state): State<AppState>,
    Json(input): Json<CreateNotification>,
) -> AppResult<impl IntoResponse> {
    let notification = state.notifications.create_for_user(input).await?;

    tracing::info!(
        notification_id = %notification.id,
        recipient = %notification.recipient_id,
        notification_type = %notification.notification_type,
        "Notification created"
    );

    Ok((StatusCode::CREATED, data(notification)))
}

/// GET /api/v1/notifications/{id}
pub async fn get_notification(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<NotificationId>,
) -> AppResult<Json<DataResponse<Notification>>> {
    let notification = find_owned(&state, &user, id).await?;
    Ok(data(notification))
}

/// DELETE /api/v1/notifications/{id}
///
/// Returns 204 No Content on success.
pub async fn delete_notification(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<NotificationId>,
) -> AppResult<impl IntoResponse> {
    find_owned(&state, &user, id).await?;
    state.notifications.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/{id}/read
///
/// Mark a single notification as read. Returns 204 No Content on success,
/// including when it was already read.
pub async fn mark_read(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<NotificationId>,
) -> AppResult<impl IntoResponse> {
    find_owned(&state, &user, id).await?;
    state.notifications.mark_as_read(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/read-all
///
/// Returns the number of notifications that were marked.
pub async fn mark_all_read(
    user: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<MarkedRead>>> {
    let marked_read = state.notifications.mark_all_as_read(&user.user_id).await?;
    Ok(data(MarkedRead { marked_read }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    user: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadCount>>> {
    let count = state.notifications.count_unread(&user.user_id).await?;
    Ok(data(UnreadCount { count }))
}

pub mod health;
pub mod notification;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /notifications                  list, create
/// /notifications/read-all         mark all read (POST)
/// /notifications/unread-count     unread count
/// /notifications/ws               live feed (WebSocket)
/// /notifications/{id}             get, delete
/// /notifications/{id}/read        mark read (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/notifications", notification::router())
}

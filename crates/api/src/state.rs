use std::sync::Arc;

use herald_db::DbPool;
use herald_events::NotificationService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Notification lifecycle service (store + live fan-out).
    pub notifications: Arc<NotificationService>,
    /// Database pool, present only with the Postgres store backend.
    pub pool: Option<DbPool>,
}

//! The persistence contract consumed by the notification service.

use async_trait::async_trait;
use herald_core::notification::{Notification, NotificationStatus};
use herald_core::types::NotificationId;

/// Errors surfaced by a [`NotificationStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Notification {id} not found")]
    NotFound { id: NotificationId },

    #[error("Notification {id} already exists")]
    AlreadyExists { id: NotificationId },

    /// Read notifications never return to unread.
    #[error("Notification {id} is read and cannot be marked unread")]
    InvalidTransition { id: NotificationId },

    /// A stored record could not be mapped back to a domain entity.
    #[error("Malformed notification record: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable CRUD for notification records.
///
/// List operations return newest first. `limit` and `offset` only take
/// effect when positive; zero or negative means "no limit" / "from the start".
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, notification: &Notification) -> StoreResult<()>;

    async fn get_by_id(&self, id: NotificationId) -> StoreResult<Notification>;

    async fn get_by_user_id(
        &self,
        recipient_id: &str,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>>;

    async fn get_unread_by_user_id(
        &self,
        recipient_id: &str,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>>;

    /// Set the status of one notification.
    ///
    /// Setting `Read` behaves like [`mark_as_read`](Self::mark_as_read).
    /// Setting `Unread` on a read notification fails with
    /// [`StoreError::InvalidTransition`].
    async fn update_status(&self, id: NotificationId, status: NotificationStatus)
        -> StoreResult<()>;

    /// Mark one notification read. Already-read is a successful no-op that
    /// leaves `read_at` untouched.
    async fn mark_as_read(&self, id: NotificationId) -> StoreResult<()>;

    /// Mark every unread notification of a recipient read, returning how many
    /// changed.
    async fn mark_all_as_read(&self, recipient_id: &str) -> StoreResult<u64>;

    async fn delete(&self, id: NotificationId) -> StoreResult<()>;

    async fn count_unread(&self, recipient_id: &str) -> StoreResult<i64>;

    /// Remove every notification whose `expires_at` has passed, returning
    /// how many this call removed.
    async fn delete_expired(&self) -> StoreResult<u64>;
}

/// Normalise caller pagination: `(limit, offset)` with non-positive values
/// meaning "unbounded" and "start", respectively.
pub(crate) fn page_bounds(limit: i64, offset: i64) -> (Option<i64>, i64) {
    let limit = (limit > 0).then_some(limit);
    (limit, offset.max(0))
}

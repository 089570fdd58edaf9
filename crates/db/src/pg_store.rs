//! PostgreSQL-backed [`NotificationStore`].

use async_trait::async_trait;
use herald_core::notification::{Notification, NotificationStatus};
use herald_core::types::NotificationId;

use crate::models::notification::NotificationRow;
use crate::repositories::NotificationRepo;
use crate::store::{page_bounds, NotificationStore, StoreError, StoreResult};
use crate::DbPool;

/// PostgreSQL unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// [`NotificationStore`] over a sqlx connection pool.
#[derive(Clone)]
pub struct PgNotificationStore {
    pool: DbPool,
}

impl PgNotificationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn list(
        &self,
        recipient_id: &str,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>> {
        let (limit, offset) = page_bounds(limit, offset);
        NotificationRepo::list_for_recipient(&self.pool, recipient_id, unread_only, limit, offset)
            .await?
            .into_iter()
            .map(to_domain)
            .collect()
    }
}

fn to_domain(row: NotificationRow) -> StoreResult<Notification> {
    let id = row.id;
    Notification::try_from(row).map_err(|e| StoreError::Corrupt(format!("{id}: {e}")))
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create(&self, notification: &Notification) -> StoreResult<()> {
        NotificationRepo::insert(&self.pool, notification)
            .await
            .map_err(|e| {
                let duplicate = matches!(
                    &e,
                    sqlx::Error::Database(db_err)
                        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
                );
                if duplicate {
                    StoreError::AlreadyExists {
                        id: notification.id,
                    }
                } else {
                    StoreError::Database(e)
                }
            })
    }

    async fn get_by_id(&self, id: NotificationId) -> StoreResult<Notification> {
        let row = NotificationRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or(StoreError::NotFound { id })?;
        to_domain(row)
    }

    async fn get_by_user_id(
        &self,
        recipient_id: &str,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>> {
        self.list(recipient_id, false, limit, offset).await
    }

    async fn get_unread_by_user_id(
        &self,
        recipient_id: &str,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>> {
        self.list(recipient_id, true, limit, offset).await
    }

    async fn update_status(
        &self,
        id: NotificationId,
        status: NotificationStatus,
    ) -> StoreResult<()> {
        match status {
            NotificationStatus::Read => self.mark_as_read(id).await,
            NotificationStatus::Unread => {
                let current = NotificationRepo::status_of(&self.pool, id)
                    .await?
                    .ok_or(StoreError::NotFound { id })?;
                if current == NotificationStatus::Read.as_str() {
                    return Err(StoreError::InvalidTransition { id });
                }
                Ok(())
            }
        }
    }

    async fn mark_as_read(&self, id: NotificationId) -> StoreResult<()> {
        if NotificationRepo::mark_read(&self.pool, id).await? {
            return Ok(());
        }
        // Nothing changed: either already read (fine) or missing.
        match NotificationRepo::status_of(&self.pool, id).await? {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound { id }),
        }
    }

    async fn mark_all_as_read(&self, recipient_id: &str) -> StoreResult<u64> {
        Ok(NotificationRepo::mark_all_read(&self.pool, recipient_id).await?)
    }

    async fn delete(&self, id: NotificationId) -> StoreResult<()> {
        if NotificationRepo::delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound { id })
        }
    }

    async fn count_unread(&self, recipient_id: &str) -> StoreResult<i64> {
        Ok(NotificationRepo::unread_count(&self.pool, recipient_id).await?)
    }

    async fn delete_expired(&self) -> StoreResult<u64> {
        let deleted = NotificationRepo::delete_expired(&self.pool).await?;
        if deleted > 0 {
            tracing::debug!(deleted, "Deleted expired notifications");
        }
        Ok(deleted)
    }
}

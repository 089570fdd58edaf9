//! In-memory [`NotificationStore`].
//!
//! Holds every record in a single `RwLock`-guarded map. Semantics match
//! [`PgNotificationStore`](crate::PgNotificationStore) so the lifecycle
//! service and HTTP layer can be exercised without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use herald_core::notification::{Notification, NotificationStatus};
use herald_core::types::NotificationId;
use tokio::sync::RwLock;

use crate::store::{page_bounds, NotificationStore, StoreError, StoreResult};

#[derive(Default)]
pub struct MemoryNotificationStore {
    records: RwLock<HashMap<NotificationId, Notification>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored records, across all recipients.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn list(
        &self,
        recipient_id: &str,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Vec<Notification> {
        let (limit, offset) = page_bounds(limit, offset);
        let records = self.records.read().await;

        let mut matching: Vec<Notification> = records
            .values()
            .filter(|n| n.recipient_id == recipient_id)
            .filter(|n| !unread_only || !n.is_read())
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let page = matching.into_iter().skip(offset as usize);
        match limit {
            Some(limit) => page.take(limit as usize).collect(),
            None => page.collect(),
        }
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn create(&self, notification: &Notification) -> StoreResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&notification.id) {
            return Err(StoreError::AlreadyExists {
                id: notification.id,
            });
        }
        records.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: NotificationId) -> StoreResult<Notification> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }

    async fn get_by_user_id(
        &self,
        recipient_id: &str,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>> {
        Ok(self.list(recipient_id, false, limit, offset).await)
    }

    async fn get_unread_by_user_id(
        &self,
        recipient_id: &str,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>> {
        Ok(self.list(recipient_id, true, limit, offset).await)
    }

    async fn update_status(
        &self,
        id: NotificationId,
        status: NotificationStatus,
    ) -> StoreResult<()> {
        match status {
            NotificationStatus::Read => self.mark_as_read(id).await,
            NotificationStatus::Unread => {
                let records = self.records.read().await;
                let current = records.get(&id).ok_or(StoreError::NotFound { id })?;
                if current.is_read() {
                    return Err(StoreError::InvalidTransition { id });
                }
                Ok(())
            }
        }
    }

    async fn mark_as_read(&self, id: NotificationId) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let notification = records.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        notification.mark_read(Utc::now());
        Ok(())
    }

    async fn mark_all_as_read(&self, recipient_id: &str) -> StoreResult<u64> {
        let now = Utc::now();
        let mut records = self.records.write().await;
        let marked = records
            .values_mut()
            .filter(|n| n.recipient_id == recipient_id)
            .map(|n| n.mark_read(now))
            .filter(|changed| *changed)
            .count();
        Ok(marked as u64)
    }

    async fn delete(&self, id: NotificationId) -> StoreResult<()> {
        self.records
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { id })
    }

    async fn count_unread(&self, recipient_id: &str) -> StoreResult<i64> {
        let records = self.records.read().await;
        let count = records
            .values()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read())
            .count();
        Ok(count as i64)
    }

    async fn delete_expired(&self) -> StoreResult<u64> {
        let now = Utc::now();
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, n| !n.is_expired(now));
        Ok((before - records.len()) as u64)
    }
}

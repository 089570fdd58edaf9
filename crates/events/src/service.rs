//! Notification lifecycle: persist first, then push to live sessions.
//!
//! [`NotificationService`] is what producers and transports call. Writes go
//! to the [`NotificationStore`]; on success the record is published to the
//! recipient's topic on the [`NotificationHub`]. A recipient with no live
//! session is normal, so an empty topic never fails the write.

use std::sync::Arc;

use chrono::Utc;
use herald_core::error::CoreError;
use herald_core::notification::{validate_notification, CreateNotification, Notification};
use herald_core::types::{NotificationId, RecipientId};
use herald_db::{NotificationStore, StoreError};
use tokio::sync::mpsc;

use crate::hub::{HubError, ReleaseHandle, SignalHub};

/// The hub instantiation used for notifications: keyed by recipient.
pub type NotificationHub = SignalHub<RecipientId, Notification>;

/// A live feed of one recipient's notifications.
pub type NotificationFeed = mpsc::Receiver<Notification>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Failed to {op}: notification {id} not found")]
    NotFound {
        op: &'static str,
        id: NotificationId,
    },

    #[error("Failed to {op}: {source}")]
    Store {
        op: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ServiceError {
    fn store(op: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |err| match err {
            StoreError::NotFound { id } => Self::NotFound { op, id },
            source => Self::Store { op, source },
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    hub: Arc<NotificationHub>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>, hub: Arc<NotificationHub>) -> Self {
        Self { store, hub }
    }

    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    /// Validate, persist, then offer the notification to the recipient's
    /// live subscribers.
    ///
    /// Nothing is published if persistence fails.
    pub async fn create(&self, notification: Notification) -> ServiceResult<Notification> {
        validate_notification(&notification)?;

        self.store
            .create(&notification)
            .await
            .map_err(ServiceError::store("create notification"))?;

        match self
            .hub
            .publish(notification.recipient_id.as_str(), notification.clone())
        {
            Ok(report) => tracing::debug!(
                notification_id = %notification.id,
                recipient = %notification.recipient_id,
                delivered = report.delivered,
                dropped = report.dropped,
                "Notification pushed to live sessions"
            ),
            Err(HubError::EmptyTopic) => tracing::debug!(
                notification_id = %notification.id,
                recipient = %notification.recipient_id,
                "Recipient has no live session, notification stored only"
            ),
        }

        Ok(notification)
    }

    /// Build a fresh unread notification from producer input and
    /// [`create`](Self::create) it.
    pub async fn create_for_user(&self, input: CreateNotification) -> ServiceResult<Notification> {
        self.create(Notification::new(input, Utc::now())).await
    }

    pub async fn get_by_id(&self, id: NotificationId) -> ServiceResult<Notification> {
        self.store
            .get_by_id(id)
            .await
            .map_err(ServiceError::store("get notification"))
    }

    /// Newest first; `limit` / `offset` apply only when positive.
    pub async fn get_by_user_id(
        &self,
        recipient_id: &str,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<Notification>> {
        self.store
            .get_by_user_id(recipient_id, limit, offset)
            .await
            .map_err(ServiceError::store("list notifications"))
    }

    pub async fn get_unread_by_user_id(
        &self,
        recipient_id: &str,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<Notification>> {
        self.store
            .get_unread_by_user_id(recipient_id, limit, offset)
            .await
            .map_err(ServiceError::store("list unread notifications"))
    }

    pub async fn count_unread(&self, recipient_id: &str) -> ServiceResult<i64> {
        self.store
            .count_unread(recipient_id)
            .await
            .map_err(ServiceError::store("count unread notifications"))
    }

    /// Idempotent: marking an already-read notification succeeds.
    pub async fn mark_as_read(&self, id: NotificationId) -> ServiceResult<()> {
        self.store
            .mark_as_read(id)
            .await
            .map_err(ServiceError::store("mark notification read"))
    }

    /// Returns how many notifications changed from unread to read.
    pub async fn mark_all_as_read(&self, recipient_id: &str) -> ServiceResult<u64> {
        let marked = self
            .store
            .mark_all_as_read(recipient_id)
            .await
            .map_err(ServiceError::store("mark all notifications read"))?;
        tracing::debug!(recipient = %recipient_id, marked, "Marked all notifications read");
        Ok(marked)
    }

    pub async fn delete(&self, id: NotificationId) -> ServiceResult<()> {
        self.store
            .delete(id)
            .await
            .map_err(ServiceError::store("delete notification"))
    }

    /// Remove every expired notification. Safe to run concurrently with
    /// another sweep.
    pub async fn delete_expired(&self) -> ServiceResult<u64> {
        self.store
            .delete_expired()
            .await
            .map_err(ServiceError::store("delete expired notifications"))
    }

    /// Open a live feed for `recipient_id`.
    ///
    /// The caller drains the feed and calls
    /// [`ReleaseHandle::release`] when its session ends (dropping the
    /// handle does the same).
    pub fn subscribe_to_notifications(
        &self,
        recipient_id: &str,
    ) -> (NotificationFeed, ReleaseHandle<Notification>) {
        self.hub.subscribe(recipient_id)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use herald_core::notification::{NotificationStatus, NotificationType};
    use herald_db::{MemoryNotificationStore, StoreResult};

    use super::*;

    fn service() -> NotificationService {
        NotificationService::new(
            Arc::new(MemoryNotificationStore::new()),
            Arc::new(NotificationHub::with_capacity(4)),
        )
    }

    /// Store whose writes always fail, to check nothing is published.
    struct FailingStore;

    #[async_trait]
    impl NotificationStore for FailingStore {
        async fn create(&self, _: &Notification) -> StoreResult<()> {
            Err(StoreError::Corrupt("disk on fire".into()))
        }
        async fn get_by_id(&self, id: NotificationId) -> StoreResult<Notification> {
            Err(StoreError::NotFound { id })
        }
        async fn get_by_user_id(&self, _: &str, _: i64, _: i64) -> StoreResult<Vec<Notification>> {
            Ok(vec![])
        }
        async fn get_unread_by_user_id(
            &self,
            _: &str,
            _: i64,
            _: i64,
        ) -> StoreResult<Vec<Notification>> {
            Ok(vec![])
        }
        async fn update_status(
            &self,
            id: NotificationId,
            _: NotificationStatus,
        ) -> StoreResult<()> {
            Err(StoreError::NotFound { id })
        }
        async fn mark_as_read(&self, id: NotificationId) -> StoreResult<()> {
            Err(StoreError::NotFound { id })
        }
        async fn mark_all_as_read(&self, _: &str) -> StoreResult<u64> {
            Ok(0)
        }
        async fn delete(&self, id: NotificationId) -> StoreResult<()> {
            Err(StoreError::NotFound { id })
        }
        async fn count_unread(&self, _: &str) -> StoreResult<i64> {
            Ok(0)
        }
        async fn delete_expired(&self) -> StoreResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn create_for_user_builds_unread_notification() {
        let svc = service();
        let n = svc
            .create_for_user(CreateNotification::new(
                "u1",
                NotificationType::GoalAchieved,
                "Goal reached",
            ))
            .await
            .unwrap();

        assert_eq!(n.status, NotificationStatus::Unread);
        assert!(!n.id.is_nil());
        assert_eq!(n.created_at, n.updated_at);
        assert_eq!(svc.get_by_id(n.id).await.unwrap(), n);
    }

    #[tokio::test]
    async fn create_with_blank_recipient_is_validation_error() {
        let svc = service();
        let result = svc
            .create_for_user(CreateNotification::new(
                "",
                NotificationType::System,
                "Maintenance",
            ))
            .await;

        assert_matches!(result, Err(ServiceError::Core(CoreError::Validation(_))));
        assert_eq!(svc.count_unread("").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn create_rejects_already_read_notification() {
        let svc = service();
        let (mut feed, _release) = svc.subscribe_to_notifications("u1");
        let mut n = Notification::new(
            CreateNotification::new("u1", NotificationType::TaskDue, "Due"),
            Utc::now(),
        );
        n.status = NotificationStatus::Read;

        assert_matches!(
            svc.create(n.clone()).await,
            Err(ServiceError::Core(CoreError::Validation(_)))
        );
        assert_matches!(svc.get_by_id(n.id).await, Err(ServiceError::NotFound { .. }));
        assert!(feed.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_persist_propagates_and_skips_publish() {
        let hub = Arc::new(NotificationHub::with_capacity(4));
        let svc = NotificationService::new(Arc::new(FailingStore), Arc::clone(&hub));
        let (mut feed, _release) = svc.subscribe_to_notifications("u1");

        let result = svc
            .create_for_user(CreateNotification::new(
                "u1",
                NotificationType::TaskDue,
                "Due",
            ))
            .await;

        assert_matches!(
            result,
            Err(ServiceError::Store {
                op: "create notification",
                source: StoreError::Corrupt(_)
            })
        );
        assert!(feed.try_recv().is_err());
    }

    #[tokio::test]
    async fn missing_ids_surface_not_found_with_context() {
        let svc = service();
        let id = uuid::Uuid::new_v4();

        assert_matches!(
            svc.mark_as_read(id).await,
            Err(ServiceError::NotFound {
                op: "mark notification read",
                id: missing
            }) if missing == id
        );
        assert_matches!(svc.delete(id).await, Err(ServiceError::NotFound { .. }));
        assert_matches!(svc.get_by_id(id).await, Err(ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn live_subscriber_receives_created_notification() {
        let svc = service();
        let (mut feed, release) = svc.subscribe_to_notifications("u1");

        let created = svc
            .create_for_user(
                CreateNotification::new("u1", NotificationType::TaskAssigned, "Review PR")
                    .with_reference("task", "17"),
            )
            .await
            .unwrap();

        assert_eq!(feed.recv().await.unwrap(), created);

        release.release();
        release.release();
        assert_eq!(svc.hub().listener_count("u1"), 0);
    }
}

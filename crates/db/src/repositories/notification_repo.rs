//! Repository for the `notifications` table.

use herald_core::notification::Notification;
use herald_core::types::NotificationId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::notification::NotificationRow;

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, recipient_id, notification_type, title, content, status, data, \
                       reference, reference_id, created_at, updated_at, read_at, expires_at";

/// Provides queries over the `notifications` table.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a fully-built notification.
    pub async fn insert(pool: &PgPool, n: &Notification) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO notifications \
             (id, recipient_id, notification_type, title, content, status, data, \
              reference, reference_id, created_at, updated_at, read_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(n.id)
        .bind(&n.recipient_id)
        .bind(n.notification_type.as_str())
        .bind(&n.title)
        .bind(&n.content)
        .bind(n.status.as_str())
        .bind(Json(&n.data))
        .bind(&n.reference)
        .bind(&n.reference_id)
        .bind(n.created_at)
        .bind(n.updated_at)
        .bind(n.read_at)
        .bind(n.expires_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Fetch one notification row by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: NotificationId,
    ) -> Result<Option<NotificationRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notifications WHERE id = $1");
        sqlx::query_as::<_, NotificationRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List notifications for a recipient, newest first.
    ///
    /// A `None` limit binds SQL `NULL`, which PostgreSQL treats as no limit.
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient_id: &str,
        unread_only: bool,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<NotificationRow>, sqlx::Error> {
        let filter = if unread_only {
            "AND status = 'unread'"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE recipient_id = $1 {filter} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, NotificationRow>(&query)
            .bind(recipient_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Current status of a notification, or `None` if it does not exist.
    pub async fn status_of(
        pool: &PgPool,
        id: NotificationId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT status FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Mark a single unread notification as read.
    ///
    /// Returns `true` if a row changed. Already-read and missing rows both
    /// return `false`; use [`status_of`](Self::status_of) to tell them apart.
    pub async fn mark_read(pool: &PgPool, id: NotificationId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET status = 'read', read_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'unread'",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark all unread notifications as read for a recipient.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(pool: &PgPool, recipient_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET status = 'read', read_at = NOW(), updated_at = NOW() \
             WHERE recipient_id = $1 AND status = 'unread'",
        )
        .bind(recipient_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Get the number of unread notifications for a recipient.
    pub async fn unread_count(pool: &PgPool, recipient_id: &str) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND status = 'unread'",
        )
        .bind(recipient_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// Delete one notification. Returns `true` if it existed.
    pub async fn delete(pool: &PgPool, id: NotificationId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every notification whose expiry has passed.
    pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM notifications \
             WHERE expires_at IS NOT NULL AND expires_at < NOW()",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

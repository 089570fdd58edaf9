//! Row type for the `notifications` table.

use std::collections::HashMap;

use herald_core::error::CoreError;
use herald_core::notification::Notification;
use herald_core::types::{NotificationId, RecipientId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `notifications` table.
///
/// Type and status are stored as text; [`TryFrom`] parses them back into
/// the closed domain enums.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: NotificationId,
    pub recipient_id: RecipientId,
    pub notification_type: String,
    pub title: String,
    pub content: String,
    pub status: String,
    pub data: Json<HashMap<String, String>>,
    pub reference: Option<String>,
    pub reference_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub read_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = CoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            recipient_id: row.recipient_id,
            notification_type: row.notification_type.parse()?,
            title: row.title,
            content: row.content,
            status: row.status.parse()?,
            data: row.data.0,
            reference: row.reference,
            reference_id: row.reference_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            read_at: row.read_at,
            expires_at: row.expires_at,
        })
    }
}

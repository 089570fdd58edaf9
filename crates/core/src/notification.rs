//! Notification entity, its closed type/status sets, and the creation DTO.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{NotificationId, RecipientId, Timestamp};

/// Maximum length of a notification title, in characters.
pub const MAX_TITLE_LENGTH: u64 = 255;

// ---------------------------------------------------------------------------
// NotificationType
// ---------------------------------------------------------------------------

/// The kinds of notification producers may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    TaskAssigned,
    TaskDue,
    TaskCompleted,
    HabitReminder,
    GoalAchieved,
    System,
}

impl NotificationType {
    /// All known notification types, in declaration order.
    pub const ALL: [NotificationType; 6] = [
        Self::TaskAssigned,
        Self::TaskDue,
        Self::TaskCompleted,
        Self::HabitReminder,
        Self::GoalAchieved,
        Self::System,
    ];

    /// Stable name used in the database and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaskAssigned => "task_assigned",
            Self::TaskDue => "task_due",
            Self::TaskCompleted => "task_completed",
            Self::HabitReminder => "habit_reminder",
            Self::GoalAchieved => "goal_achieved",
            Self::System => "system",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown notification type '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// NotificationStatus
// ---------------------------------------------------------------------------

/// Read state of a notification. Only ever moves from `Unread` to `Read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    #[default]
    Unread,
    Read,
}

impl NotificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(Self::Unread),
            "read" => Ok(Self::Read),
            other => Err(CoreError::Validation(format!(
                "Unknown notification status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// A notification addressed to a single recipient.
///
/// This is both the persisted record and the message delivered to live
/// subscribers, unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Notification {
    pub id: NotificationId,
    #[validate(length(min = 1, message = "recipient_id is required"))]
    pub recipient_id: RecipientId,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[validate(length(max = MAX_TITLE_LENGTH, message = "title must be at most 255 characters"))]
    pub title: String,
    pub content: String,
    pub status: NotificationStatus,
    /// Structured payload, e.g. deep-link parameters.
    #[serde(default)]
    pub data: HashMap<String, String>,
    /// Kind of the entity that caused this notification (informational).
    pub reference: Option<String>,
    pub reference_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub read_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
}

impl Notification {
    /// Build a fresh, unread notification from producer input.
    ///
    /// `created_at` and `updated_at` are both set to `now`.
    pub fn new(input: CreateNotification, now: Timestamp) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            recipient_id: input.recipient_id,
            notification_type: input.notification_type,
            title: input.title,
            content: input.content,
            status: NotificationStatus::Unread,
            data: input.data,
            reference: input.reference,
            reference_id: input.reference_id,
            created_at: now,
            updated_at: now,
            read_at: None,
            expires_at: input.expires_at,
        }
    }

    pub fn is_read(&self) -> bool {
        self.status == NotificationStatus::Read
    }

    /// Whether the notification's expiry has passed at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }

    /// Apply the Unread -> Read transition.
    ///
    /// Returns `false` (and changes nothing) when already read, so `read_at`
    /// is only ever stamped once.
    pub fn mark_read(&mut self, now: Timestamp) -> bool {
        if self.is_read() {
            return false;
        }
        self.status = NotificationStatus::Read;
        self.read_at = Some(now);
        self.updated_at = now;
        true
    }
}

/// Check a notification before it is first persisted.
///
/// Besides the field rules, a new record must be in its initial state:
/// unread, never read, untouched since creation, with a real id. `Read` is
/// only reachable through [`Notification::mark_read`].
pub fn validate_notification(notification: &Notification) -> Result<(), CoreError> {
    notification
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    if notification.recipient_id.trim().is_empty() {
        return Err(CoreError::Validation("recipient_id is required".into()));
    }
    if notification.id.is_nil() {
        return Err(CoreError::Validation("id must not be nil".into()));
    }
    if notification.status != NotificationStatus::Unread || notification.read_at.is_some() {
        return Err(CoreError::Validation("new notifications must be unread".into()));
    }
    if notification.created_at != notification.updated_at {
        return Err(CoreError::Validation(
            "updated_at must equal created_at on creation".into(),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Producer input for creating a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotification {
    pub recipient_id: RecipientId,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
    pub reference: Option<String>,
    pub reference_id: Option<String>,
    pub expires_at: Option<Timestamp>,
}

impl CreateNotification {
    /// Minimal input: recipient, type and title; everything else empty.
    pub fn new(
        recipient_id: impl Into<RecipientId>,
        notification_type: NotificationType,
        title: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            notification_type,
            title: title.into(),
            content: String::new(),
            data: HashMap::new(),
            reference: None,
            reference_id: None,
            expires_at: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Point at the domain entity that caused the notification.
    pub fn with_reference(mut self, kind: impl Into<String>, id: impl Into<String>) -> Self {
        self.reference = Some(kind.into());
        self.reference_id = Some(id.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    use super::*;

    fn sample() -> Notification {
        Notification::new(
            CreateNotification::new("user-1", NotificationType::TaskAssigned, "New task")
                .with_content("You were assigned 'Write report'")
                .with_data("task_id", "42")
                .with_reference("task", "42"),
            Utc::now(),
        )
    }

    #[test]
    fn new_notification_is_unread_with_matching_timestamps() {
        let n = sample();
        assert_eq!(n.status, NotificationStatus::Unread);
        assert!(!n.id.is_nil());
        assert_eq!(n.created_at, n.updated_at);
        assert!(n.read_at.is_none());
        assert_eq!(n.data.get("task_id").map(String::as_str), Some("42"));
        assert_eq!(n.reference.as_deref(), Some("task"));
    }

    #[test]
    fn mark_read_stamps_read_at_once() {
        let mut n = sample();
        let first = n.created_at + Duration::seconds(5);
        assert!(n.mark_read(first));
        assert_eq!(n.read_at, Some(first));
        assert_eq!(n.updated_at, first);

        let second = first + Duration::seconds(5);
        assert!(!n.mark_read(second));
        assert_eq!(n.read_at, Some(first));
        assert_eq!(n.updated_at, first);
    }

    #[test]
    fn expiry_is_strictly_in_the_past() {
        let now = Utc::now();
        let mut n = sample();
        assert!(!n.is_expired(now));

        n.expires_at = Some(now - Duration::minutes(1));
        assert!(n.is_expired(now));

        n.expires_at = Some(now + Duration::minutes(1));
        assert!(!n.is_expired(now));
    }

    #[test]
    fn blank_recipient_is_rejected() {
        let mut n = sample();
        n.recipient_id = "   ".into();
        assert_matches!(validate_notification(&n), Err(CoreError::Validation(_)));

        n.recipient_id = String::new();
        assert_matches!(validate_notification(&n), Err(CoreError::Validation(_)));
    }

    #[test]
    fn overlong_title_is_rejected() {
        let mut n = sample();
        n.title = "x".repeat(MAX_TITLE_LENGTH as usize + 1);
        assert_matches!(validate_notification(&n), Err(CoreError::Validation(_)));
    }

    #[test]
    fn only_fresh_unread_records_pass() {
        let mut read = sample();
        read.status = NotificationStatus::Read;
        assert_matches!(validate_notification(&read), Err(CoreError::Validation(_)));

        let mut stamped = sample();
        stamped.read_at = Some(stamped.created_at);
        assert_matches!(validate_notification(&stamped), Err(CoreError::Validation(_)));

        let mut touched = sample();
        touched.updated_at = touched.created_at + Duration::seconds(1);
        assert_matches!(validate_notification(&touched), Err(CoreError::Validation(_)));

        let mut nil = sample();
        nil.id = uuid::Uuid::nil();
        assert_matches!(validate_notification(&nil), Err(CoreError::Validation(_)));
    }

    #[test]
    fn valid_notification_passes() {
        assert!(validate_notification(&sample()).is_ok());
    }

    #[test]
    fn type_names_round_trip_through_from_str() {
        for t in NotificationType::ALL {
            assert_eq!(t.as_str().parse::<NotificationType>().unwrap(), t);
        }
        assert_matches!(
            "birthday".parse::<NotificationType>(),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn serializes_type_under_type_key() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["type"], "task_assigned");
        assert_eq!(json["status"], "unread");
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!(
            "read".parse::<NotificationStatus>().unwrap(),
            NotificationStatus::Read
        );
        assert_matches!(
            "archived".parse::<NotificationStatus>(),
            Err(CoreError::Validation(_))
        );
    }
}

/// Notifications are identified by a random UUID assigned at creation.
pub type NotificationId = uuid::Uuid;

/// Recipients are identified by the user id issued by the identity provider.
/// The same value is used as the fan-out topic key.
pub type RecipientId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

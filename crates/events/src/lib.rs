//! Herald real-time notification fan-out.
//!
//! This crate provides:
//!
//! - [`SignalHub`]: per-topic publish/subscribe hub with bounded,
//!   non-blocking subscriber queues and idempotent [`ReleaseHandle`]s.
//! - [`NotificationService`]: the lifecycle façade that persists
//!   notifications and pushes them to the recipient's live sessions.
//! - [`ExpirySweeper`]: background task deleting expired notifications.

pub mod hub;
pub mod service;
pub mod sweeper;

pub use hub::{HubError, PublishReport, ReleaseHandle, SignalHub, DEFAULT_QUEUE_CAPACITY};
pub use service::{
    NotificationFeed, NotificationHub, NotificationService, ServiceError, ServiceResult,
};
pub use sweeper::{ExpirySweeper, DEFAULT_SWEEP_INTERVAL};

//! Live notification feed over WebSocket.

mod handler;

pub use handler::notification_feed;

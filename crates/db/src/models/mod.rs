//! Database row types and their mapping to domain entities.

pub mod notification;

//! Domain types shared by the herald crates.
//!
//! Nothing in here performs I/O: persistence lives in `herald-db`, fan-out
//! and the lifecycle service live in `herald-events`.

pub mod error;
pub mod notification;
pub mod types;

#![forbid(unsafe_code)]

//! Recurring group alarm bot core.
//!
//! Users define recurring notifications over a three-step chat conversation
//! (start time, repeat interval, payload); each alarm then redelivers its
//! payload to the group at a fixed cadence, surviving restarts by
//! fast-forwarding to the next aligned occurrence instead of replaying
//! missed ticks.

pub mod attachments;
pub mod config;
pub mod conversation;
pub mod errors;
pub mod models;
pub mod persistence;
pub mod router;
pub mod scheduler;
pub mod transport;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};

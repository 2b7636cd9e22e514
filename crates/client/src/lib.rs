//! Client library for the weekly planner
//!
//! Talks to the task REST API and keeps a week board in sync with it:
//! - [`HttpTaskApi`]: typed HTTP calls
//! - [`OptimisticApi`]: local-first mutations with rollback
//! - [`WeekBoard`]: the displayed week and every user action on it

pub mod api;
pub mod board;
pub mod config;
pub mod error;
pub mod notify;
pub mod optimistic;
pub mod sequence;

pub use api::{HttpTaskApi, TaskApi};
pub use board::WeekBoard;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use notify::{Notification, NotificationKind, Notifier};
pub use optimistic::{Created, OptimisticApi};
pub use sequence::{RequestSequencer, Ticket};

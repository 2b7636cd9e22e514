//! Task module
//!
//! This module contains task-related types and logic.

mod file_store;
mod model;
mod repository;
mod service;
mod validation;

pub use file_store::FileTaskStore;
pub use model::*;
pub use repository::TaskRepository;
pub use service::{TaskService, Upserted, DEFAULT_CACHE_TTL};
pub use validation::{DateRangeQuery, TaskPayload};

//! Core library for the weekly planner
//!
//! This crate contains the core business logic, including:
//! - Task model, storage and validation
//! - Per-day task caching
//! - Week board state and its transitions

pub mod cache;
pub mod calendar;
pub mod error;
pub mod task;
pub mod week;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

//! Task caching
//!
//! A small key/value contract with expiry, plus the key scheme used for
//! per-day task lists and single tasks.

mod keys;
mod memory;

pub use keys::{day_key, task_key, CACHE_PREFIX};
pub use memory::MemoryCache;

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Key/value cache holding serialized values with an expiry
#[async_trait]
pub trait TaskCache: Send + Sync {
    /// Get a live value, `None` when missing or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value that expires after `ttl`
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Remove a value; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;
}

//! Key/value cache in front of the order store.
//!
//! # Main Components
//!
//! - [`CacheStore`] - get / set / atomic multi-key set over raw bytes, no expiry
//! - [`MemoryCache`] - in-process implementation backed by a single cache actor
//! - [`CacheCodec`] / [`JsonCodec`] - the serialization boundary for cached values
//! - [`CacheKey`] - the order key namespace
//!
//! A multi-key set is atomic only across its own keys. It knows nothing about the
//! store, so a committed order can sit next to a stale or missing cache entry.

pub mod codec;
pub mod keys;
pub mod memory;

pub use codec::*;
pub use keys::*;
pub use memory::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a cache backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CacheError {
    /// The backend could not be reached.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// A multi-key transaction did not commit; none of its keys changed.
    #[error("Cache transaction aborted: {0}")]
    TransactionAborted(String),
}

/// Byte-oriented cache operations the coordinator relies on.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored bytes, or `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key` with no expiry.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;

    /// Stores every entry or none of them.
    async fn set_multi_atomic(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), CacheError>;
}

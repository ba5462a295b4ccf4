//! Errors returned to callers of the order coordinator.

use crate::cache::{CacheError, CodecError};
use crate::model::OrderId;
use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur during order reads and placement.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The (user-scoped) lookup found nothing.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// The store failed; nothing was written to the cache.
    #[error("Order store failure: {0}")]
    Store(String),

    /// The order is committed in the store but the cache transaction did not
    /// commit, so cached views may be missing or stale. Not retried.
    #[error("Order {order_id} was stored but the cache transaction failed: {reason}")]
    CacheTransaction { order_id: OrderId, reason: String },

    /// A plain cache read or write failed.
    #[error("Order cache error: {0}")]
    Cache(String),

    /// A cached value could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl From<StoreError> for OrderError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => OrderError::NotFound(what),
            other => OrderError::Store(other.to_string()),
        }
    }
}

impl From<CacheError> for OrderError {
    fn from(e: CacheError) -> Self {
        OrderError::Cache(e.to_string())
    }
}

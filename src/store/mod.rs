//! The store gateway: canonical order, menu and subscription records.
//!
//! The coordinator only talks to the [`OrderStore`] trait. [`MemoryStore`] is the
//! in-process implementation, one table actor per record type; each request is
//! handled to completion by its table before the next one, which gives per-row
//! commits and nothing more.

pub mod memory;
pub mod tables;

pub use memory::*;
pub use tables::*;

use crate::framework::FrameworkError;
use crate::model::{
    NewOrder, NotificationSubscription, Order, OrderId, PizzaSpecial, SubscriptionCreate, Topping,
};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the store gateway.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// No row matched the id (and user scope, when given).
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The store refused the write.
    #[error("Record rejected: {0}")]
    Rejected(String),

    /// The store could not be reached or failed mid-request.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<FrameworkError> for StoreError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::NotFound(id) => StoreError::NotFound(id),
            FrameworkError::Custom(msg) => StoreError::Rejected(msg),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Record operations the order core consumes.
///
/// Orders come back with every pizza line resolved against the menu tables.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// All orders, newest first; only `user_id`'s orders when given.
    async fn list_orders(&self, user_id: Option<&str>) -> Result<Vec<Order>, StoreError>;

    /// One order. `NotFound` if the id is unknown or belongs to another user.
    async fn get_order(&self, id: OrderId, user_id: Option<&str>) -> Result<Order, StoreError>;

    /// Inserts the order and returns the id the store assigned.
    async fn create_order(&self, order: NewOrder) -> Result<OrderId, StoreError>;

    async fn find_special(&self, id: u32) -> Result<Option<PizzaSpecial>, StoreError>;

    async fn find_topping(&self, id: u32) -> Result<Option<Topping>, StoreError>;

    async fn list_specials(&self) -> Result<Vec<PizzaSpecial>, StoreError>;

    /// Toppings ordered by name.
    async fn list_toppings(&self) -> Result<Vec<Topping>, StoreError>;

    async fn find_subscription(&self, user_id: &str) -> Result<Option<NotificationSubscription>, StoreError>;

    /// Registers a push endpoint, replacing whatever the user had before.
    async fn subscribe(&self, subscription: SubscriptionCreate) -> Result<NotificationSubscription, StoreError>;
}

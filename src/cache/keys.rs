use crate::model::OrderId;
use std::fmt::Display;

/// The cache key namespace for orders.
///
/// | Key | Written by |
/// |---|---|
/// | `orders_all` | read path only; never refreshed by `place` |
/// | `orders_{user}` | read path and write-through |
/// | `order_{id}` | read path and write-through |
/// | `order_{id}_{user}` | read path only |
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    AllOrders,
    UserOrders(String),
    Order(OrderId),
    UserOrder(OrderId, String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::AllOrders => write!(f, "orders_all"),
            CacheKey::UserOrders(user_id) => write!(f, "orders_{user_id}"),
            CacheKey::Order(id) => write!(f, "order_{id}"),
            CacheKey::UserOrder(id, user_id) => write!(f, "order_{id}_{user_id}"),
        }
    }
}

use crate::model::{PizzaSpecial, Topping};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Store-assigned identifier for Orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u32);

impl From<u32> for OrderId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLong {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLong {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Both coordinates are real numbers (no NaN or infinity).
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Point on the straight line from `start` to `end`; `proportion` is clamped to `0..=1`.
    pub fn interpolate(start: LatLong, end: LatLong, proportion: f64) -> LatLong {
        let p = proportion.clamp(0.0, 1.0);
        LatLong {
            latitude: start.latitude + (end.latitude - start.latitude) * p,
            longitude: start.longitude + (end.longitude - start.longitude) * p,
        }
    }
}

/// Reference to a menu special plus its toppings, by id only.
///
/// This is what callers submit and what the store persists. Resolved objects
/// never travel inward from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PizzaRef {
    pub special_id: u32,
    pub topping_ids: Vec<u32>,
}

/// One resolved pizza of an order.
///
/// `special` / `topping` are `None` when the referenced id does not exist in the
/// store (placement zeroes such ids).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PizzaLine {
    pub special_id: u32,
    pub special: Option<PizzaSpecial>,
    pub toppings: Vec<PizzaTopping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PizzaTopping {
    pub topping_id: u32,
    pub topping: Option<Topping>,
}

/// Represents a placed pizza order.
///
/// Orders are created once by the coordinator and never mutated afterwards.
/// The store hands them out with every line already resolved against the menu
/// (see [`PizzaLine`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub delivery_location: LatLong,
    pub pizzas: Vec<PizzaLine>,
}

/// What the caller asks for when placing an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub delivery_location: LatLong,
    pub pizzas: Vec<PizzaRef>,
}

/// Payload for inserting a new order row. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub delivery_location: LatLong,
    pub pizzas: Vec<PizzaRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_clamps_proportion() {
        let start = LatLong::new(0.0, 0.0);
        let end = LatLong::new(10.0, -20.0);

        assert_eq!(LatLong::interpolate(start, end, 0.5), LatLong::new(5.0, -10.0));
        assert_eq!(LatLong::interpolate(start, end, 3.0), end);
        assert_eq!(LatLong::interpolate(start, end, -1.0), start);
    }

    #[test]
    fn test_is_finite() {
        assert!(LatLong::new(51.5, -0.12).is_finite());
        assert!(!LatLong::new(f64::NAN, 0.0).is_finite());
        assert!(!LatLong::new(0.0, f64::NEG_INFINITY).is_finite());
    }

    #[test]
    fn test_order_id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&OrderId(12)).unwrap(), "12");
        assert_eq!(OrderId(12).to_string(), "12");
    }
}

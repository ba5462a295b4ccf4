//! # Delivery Status
//!
//! The delivery phase of an order is never stored. It is a projection of the
//! order's creation time and the instant of the query:
//!
//! ```text
//! elapsed <  P          -> Preparing
//! P <= elapsed < P + D  -> Dispatched
//! elapsed >= P + D      -> Delivered
//! ```
//!
//! Ties go to the later phase. Everything in here is pure; callers pass `now`.

use crate::model::{LatLong, Order};
use chrono::{DateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// The two fixed durations every order goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryDurations {
    preparation: TimeDelta,
    delivery: TimeDelta,
}

impl DeliveryDurations {
    pub fn from_secs(preparation: u32, delivery: u32) -> Self {
        Self {
            preparation: TimeDelta::seconds(i64::from(preparation)),
            delivery: TimeDelta::seconds(i64::from(delivery)),
        }
    }

    pub fn preparation(&self) -> TimeDelta {
        self.preparation
    }

    pub fn delivery(&self) -> TimeDelta {
        self.delivery
    }

    /// Preparation time as a timer duration.
    pub fn preparation_timer(&self) -> std::time::Duration {
        self.preparation.to_std().unwrap_or_default()
    }

    /// Delivery time as a timer duration.
    pub fn delivery_timer(&self) -> std::time::Duration {
        self.delivery.to_std().unwrap_or_default()
    }
}

impl Default for DeliveryDurations {
    fn default() -> Self {
        Self::from_secs(10, 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeliveryPhase {
    Preparing,
    Dispatched,
    Delivered,
}

impl DeliveryPhase {
    pub fn status_text(&self) -> &'static str {
        match self {
            DeliveryPhase::Preparing => "Preparing",
            DeliveryPhase::Dispatched => "Out for delivery",
            DeliveryPhase::Delivered => "Delivered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub description: String,
    pub position: LatLong,
    pub show_popup: bool,
}

impl MapMarker {
    fn new(description: &str, position: LatLong, show_popup: bool) -> Self {
        Self {
            description: description.to_string(),
            position,
            show_popup,
        }
    }
}

/// Status of an order as seen at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedStatus {
    pub phase: DeliveryPhase,
    pub status_text: String,
    pub dispatch_time: DateTime<Utc>,
    pub estimated_delivery_time: DateTime<Utc>,
    pub map_markers: Vec<MapMarker>,
}

/// An order together with the status computed when the snapshot was taken.
///
/// This is the value the cache holds. Once cached the status does not advance;
/// it is only replaced when the entry is overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWithStatus {
    pub order: Order,
    pub status: DerivedStatus,
}

impl OrderWithStatus {
    pub fn from_order(order: Order, now: DateTime<Utc>, durations: &DeliveryDurations) -> Self {
        let status = derive_status(&order, now, durations);
        Self { order, status }
    }
}

/// Phase of an order created at `created_at`, observed at `now`.
///
/// A `now` before `created_at` counts as no time elapsed.
pub fn phase_at(created_at: DateTime<Utc>, now: DateTime<Utc>, durations: &DeliveryDurations) -> DeliveryPhase {
    let elapsed = (now - created_at).max(TimeDelta::zero());
    if elapsed < durations.preparation {
        DeliveryPhase::Preparing
    } else if elapsed < durations.preparation + durations.delivery {
        DeliveryPhase::Dispatched
    } else {
        DeliveryPhase::Delivered
    }
}

/// Computes the full status of `order` at `now`.
pub fn derive_status(order: &Order, now: DateTime<Utc>, durations: &DeliveryDurations) -> DerivedStatus {
    let dispatch_time = order.created_at + durations.preparation;
    let estimated_delivery_time = dispatch_time + durations.delivery;
    let phase = phase_at(order.created_at, now, durations);

    let map_markers = match phase {
        DeliveryPhase::Preparing => vec![MapMarker::new("You", order.delivery_location, true)],
        DeliveryPhase::Dispatched => {
            let proportion = delivery_progress(now - dispatch_time, durations.delivery);
            let courier = LatLong::interpolate(courier_start(order), order.delivery_location, proportion);
            vec![
                MapMarker::new("You", order.delivery_location, false),
                MapMarker::new("Driver", courier, true),
            ]
        }
        DeliveryPhase::Delivered => vec![MapMarker::new("Delivery location", order.delivery_location, true)],
    };

    DerivedStatus {
        phase,
        status_text: phase.status_text().to_string(),
        dispatch_time,
        estimated_delivery_time,
        map_markers,
    }
}

fn delivery_progress(since_dispatch: TimeDelta, delivery: TimeDelta) -> f64 {
    let total = delivery.num_milliseconds();
    if total <= 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = since_dispatch.num_milliseconds() as f64 / total as f64;
    ratio.min(1.0)
}

/// Where the courier sets off from: a fixed pseudo-random point near the
/// delivery location, seeded by the order id so every read agrees.
fn courier_start(order: &Order) -> LatLong {
    let mut rng = StdRng::seed_from_u64(u64::from(order.id.0));
    let distance = 0.01 + rng.random::<f64>() * 0.02;
    let angle = rng.random::<f64>() * TAU;
    LatLong::new(
        order.delivery_location.latitude + distance * angle.cos(),
        order.delivery_location.longitude + distance * angle.sin(),
    )
}

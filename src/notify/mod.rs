//! Delayed delivery notifications for placed orders.
//!
//! - [`PushTransport`] - sends one message to one subscription
//! - [`NotificationScheduler`] - starts one detached stage sequence per order

pub mod scheduler;
pub mod transport;

pub use scheduler::*;
pub use transport::*;

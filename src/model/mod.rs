//! Pure data structures shared by the store, the cache and the coordinator.

pub mod menu;
pub mod order;
pub mod subscription;

pub use menu::*;
pub use order::*;
pub use subscription::*;

//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the `tracing-subscriber` formatter used by the
//! binary. Log levels come from `RUST_LOG`; module paths are hidden and spans
//! are shown inline.
//!
//! ## What Gets Traced
//!
//! - **Actor lifecycle**: start and shutdown of every table, the cache and the
//!   notification supervisor
//! - **Coordinator operations**: one span per read or placement, with the cache
//!   hit or miss recorded under `key`
//! - **Notifications**: scheduling (with the current `in_flight` count), every
//!   stage at `debug`, and each send or failure
//!
//! ```bash
//! # Placement and notification milestones
//! RUST_LOG=info cargo run
//!
//! # Cache hits and misses, stage transitions, table requests
//! RUST_LOG=debug cargo run
//!
//! # Just the coordinator
//! RUST_LOG=pizza_orders::coordinator=debug cargo run
//! ```
//!
//! With `RUST_LOG=info` a placement reads like:
//!
//! ```text
//! INFO place{user_id="alice" pizzas=1}:create_order{user_id="alice"}: Order committed order_id=1
//! INFO place{user_id="alice" pizzas=1}: Order placed order_id=1
//! INFO Notification sequence scheduled order_id=1 in_flight=1
//! INFO Push notification sent order_id=1 message="Your order has been dispatched!"
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}

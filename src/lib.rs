//! # Pizza Orders
//!
//! > **Order cache coordination and delayed delivery notifications for a pizza storefront.**
//!
//! Orders live in a store and are read through a key/value cache. Each order's
//! delivery status is derived from its age, and every order whose customer has
//! a push subscription gets two delayed notifications: one when it leaves the
//! kitchen and one when it arrives.
//!
//! ## Core Concepts
//!
//! ### Cache-aside reads, write-through placement
//! Reads check the cache first and populate it on a miss. Placing an order
//! commits it to the store, then writes the new order's view and the customer's
//! refreshed order list in one cache transaction. The global `orders_all` list
//! is left alone and goes stale.
//!
//! ### Derived status
//! Nothing stores "dispatched" or "delivered". [`status::derive_status`] computes
//! the phase from the creation time and the moment of the read, and a cached
//! view keeps the status it had when it was written.
//!
//! ### Actors
//! The in-memory store tables and the cache each run in their own Tokio task
//! and process requests one at a time. Tables are generic
//! [`ResourceActor`](framework::ResourceActor)s; see [`framework::mock`] for
//! testing against scripted tables.
//!
//! ## Module Tour
//!
//! - [`store`] - the [`OrderStore`](store::OrderStore) gateway and its actor-backed implementation
//! - [`cache`] - the [`CacheStore`](cache::CacheStore) trait, cache actor, codec and key namespace
//! - [`status`] - pure delivery status derivation
//! - [`coordinator`] - [`OrderCoordinator`](coordinator::OrderCoordinator), the read and placement paths
//! - [`notify`] - push transport and the notification supervisor
//! - [`lifecycle`] - [`OrderSystem`](lifecycle::OrderSystem) wiring, shutdown and tracing setup
//! - [`config`] - environment configuration
//!
//! ### Running the Demo
//!
//! ```bash
//! PUSH_VAPID_PUBLIC_KEY=... PUSH_VAPID_PRIVATE_KEY=... RUST_LOG=info cargo run
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod notify;
pub mod status;
pub mod store;

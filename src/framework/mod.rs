//! Generic table actors the in-memory store is built from.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait that row types implement to be owned by a table actor
//! - [`ResourceActor`] - Generic actor that owns one table
//! - [`ResourceClient`] - Type-safe handle for sending requests to a table
//! - [`FrameworkError`] - Common plumbing errors
//!
//! # Testing
//!
//! See [`mock`] module for scripting table responses without spawning actors.

pub mod core;
pub mod mock;

// Re-export core types for convenience
pub use core::*;

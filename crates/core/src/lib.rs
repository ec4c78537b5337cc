//! `sourced-core`: building blocks shared by event-sourced entities.
//!
//! This crate contains **pure** primitives (no IO, no entity knowledge):
//! the error model, identifiers and structural value utilities.

pub mod error;
pub mod id;
pub mod value;

pub use error::{EntityError, EntityResult};
pub use id::{EntityId, EntityIdentity};

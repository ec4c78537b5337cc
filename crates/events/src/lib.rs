//! `sourced-events`: event-sourced entities.
//!
//! An [`Entity`] records state-changing commands as immutable [`Event`]s,
//! replays recorded events to rebuild state without side effects, and can be
//! frozen into a [`Snapshot`] and restored from one. Storage of events and
//! snapshots, and delivery of queued side effects, are left to the caller.

pub mod emitter;
pub mod engine;
pub mod entity;
pub mod event;
pub mod handler;
pub mod queue;
pub mod snapshot;

#[cfg(test)]
mod testing;

pub use emitter::{ERROR_CHANNEL, Emitter, ListenerId};
pub use engine::{Applied, ApplyMode, EventEngine};
pub use entity::{ABSTRACT_SCOPE, Entity, EntityBase, Mode, short_type_name};
pub use event::Event;
pub use handler::HandlerTable;
pub use queue::QueuedEffect;
pub use snapshot::{PERSISTENCE_ID_FIELD, Snapshot};

pub use sourced_core::{EntityError, EntityId, EntityIdentity, EntityResult};

//! Event construction and application.
//!
//! Two operations bound to an entity:
//! - **make**: stamp the entity (revision + 1, ts = now) and capture an
//!   immutable [`Event`] from the updated stamp.
//! - **apply**: either append the event to the live log, or re-run the
//!   matching command handler in replay mode.
//!
//! Stamping happens exactly once, at creation. Applying never re-stamps; in
//! replay it *copies* the event's stamp back onto the entity.

use chrono::Utc;
use serde_json::Value;

use sourced_core::EntityResult;

use crate::entity::{Entity, EntityBase, Mode};
use crate::event::Event;

/// How an event is being applied.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ApplyMode {
    /// Freshly recorded: the handler already ran, log the event.
    Live,
    /// Previously recorded: re-run the handler, log nothing.
    Replay,
}

/// Outcome of [`EventEngine::apply_event`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Appended to the live log; carries the new log length.
    Logged(usize),
    /// Handler re-applied in replay mode.
    Replayed,
    /// No handler registered for the command; only the stamp was copied.
    Skipped,
}

/// Stateless event engine.
#[derive(Debug, Copy, Clone, Default)]
pub struct EventEngine;

impl EventEngine {
    /// Advance `base` by one revision and capture the event.
    ///
    /// The revision/ts update is visible on `base` even if the returned event
    /// is never applied.
    pub fn make_event<Id: Clone>(
        base: &mut EntityBase<Id>,
        cmd: impl Into<String>,
        data: Value,
    ) -> Event<Id> {
        base.advance(Utc::now());
        Event::new(
            cmd,
            data,
            base.id().clone(),
            base.ts(),
            base.scope(),
            base.version(),
            base.revision(),
        )
    }

    /// Apply `event` to `entity`.
    ///
    /// Both modes first copy `ts`, `scope` and `revision` from the event. A
    /// replayed event whose command has no handler is a no-op beyond that
    /// copy, so the entity's position in the stream stays consistent.
    pub fn apply_event<E: Entity>(
        entity: &mut E,
        event: &Event<E::Id>,
        mode: ApplyMode,
    ) -> EntityResult<Applied> {
        let base = entity.base_mut();
        base.copy_stamp(event.ts(), event.scope(), event.revision());

        if mode == ApplyMode::Live {
            return Ok(Applied::Logged(base.log(event.clone())));
        }

        let Some(handler) = E::handlers().get(event.cmd()) else {
            tracing::debug!(
                scope = event.scope(),
                cmd = event.cmd(),
                revision = event.revision(),
                "no handler for replayed command, skipping"
            );
            return Ok(Applied::Skipped);
        };

        let previous = base.replace_mode(Mode::Replaying);
        let outcome = handler(entity, event.data());
        entity.base_mut().replace_mode(previous);
        outcome?;

        Ok(Applied::Replayed)
    }
}

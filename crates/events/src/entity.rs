//! Event-sourced entity: base state + record/replay/snapshot protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};

use sourced_core::{EntityError, EntityIdentity, EntityResult, value};

use crate::emitter::{ERROR_CHANNEL, Emitter, ListenerId};
use crate::engine::{ApplyMode, EventEngine};
use crate::event::Event;
use crate::handler::HandlerTable;
use crate::queue::QueuedEffect;
use crate::snapshot::{PERSISTENCE_ID_FIELD, Snapshot};

/// Scope name reserved for the abstract base itself.
pub const ABSTRACT_SCOPE: &str = "Entity";

/// Whether the entity is applying fresh commands or re-applying history.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Live,
    Replaying,
}

/// Per-process state that is never serialized, snapshotted or restored.
#[derive(Debug)]
struct Runtime<Id> {
    mode: Mode,
    events: Vec<Event<Id>>,
    queue: Vec<QueuedEffect>,
    emitter: Emitter,
}

impl<Id> Default for Runtime<Id> {
    fn default() -> Self {
        Self {
            mode: Mode::Live,
            events: Vec::new(),
            queue: Vec::new(),
            emitter: Emitter::new(),
        }
    }
}

/// State every entity carries, embedded with `#[serde(flatten)]`.
///
/// Fields are read-only from outside this crate; the event engine and the
/// [`Entity`] protocol are the only writers.
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "Id: Serialize", deserialize = "Id: Deserialize<'de>"))]
pub struct EntityBase<Id> {
    id: Id,
    scope: String,
    version: u64,
    revision: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    ts: DateTime<Utc>,
    #[serde(skip)]
    runtime: Runtime<Id>,
}

impl<Id: EntityIdentity> EntityBase<Id> {
    /// Base state for the concrete entity type `E`, scoped by its type name.
    pub fn new<E>(id: Id) -> EntityResult<Self>
    where
        E: Entity<Id = Id>,
    {
        Self::with_scope(id, E::scope_name(), None)
    }

    /// Base state with an explicit scope.
    ///
    /// An empty scope or [`ABSTRACT_SCOPE`] means nobody derived from the
    /// base: construction fails, and the failure is also emitted on
    /// `reporter`'s `error` channel when one is supplied.
    pub fn with_scope(
        id: Id,
        scope: impl Into<String>,
        reporter: Option<&mut Emitter>,
    ) -> EntityResult<Self> {
        let scope = scope.into();
        if scope.trim().is_empty() || scope == ABSTRACT_SCOPE {
            let err = EntityError::abstract_instantiation(&scope);
            tracing::error!(scope = %scope, error = %err, "rejected entity construction");
            if let Some(reporter) = reporter {
                reporter.emit(
                    ERROR_CHANNEL,
                    &json!({ "name": "EntityError", "message": err.to_string(), "scope": scope }),
                );
            }
            return Err(err);
        }

        Ok(Self {
            id,
            scope,
            version: 0,
            revision: 0,
            ts: Utc::now(),
            runtime: Runtime::default(),
        })
    }
}

impl<Id> EntityBase<Id> {
    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Revision at the last snapshot (0 before the first one).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of events applied to this instance, live or replayed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Time of the last state mutation.
    pub fn ts(&self) -> DateTime<Utc> {
        self.ts
    }

    pub fn mode(&self) -> Mode {
        self.runtime.mode
    }

    pub fn is_replaying(&self) -> bool {
        self.runtime.mode == Mode::Replaying
    }

    /// Events recorded live by this instance, in recording order.
    pub fn events(&self) -> &[Event<Id>] {
        &self.runtime.events
    }

    /// Pending side effects, in enqueue order.
    pub fn queue(&self) -> &[QueuedEffect] {
        &self.runtime.queue
    }

    pub fn emitter(&self) -> &Emitter {
        &self.runtime.emitter
    }

    pub(crate) fn advance(&mut self, now: DateTime<Utc>) {
        self.revision += 1;
        self.ts = now;
    }

    pub(crate) fn copy_stamp(&mut self, ts: DateTime<Utc>, scope: &str, revision: u64) {
        self.ts = ts;
        if self.scope != scope {
            self.scope = scope.to_string();
        }
        self.revision = revision;
    }

    pub(crate) fn log(&mut self, event: Event<Id>) -> usize {
        self.runtime.events.push(event);
        self.runtime.events.len()
    }

    pub(crate) fn replace_mode(&mut self, mode: Mode) -> Mode {
        std::mem::replace(&mut self.runtime.mode, mode)
    }
}

/// Short type name of `T`, without module path or generic arguments.
pub fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let head = full.split('<').next().unwrap_or(full);
    head.rsplit("::").next().unwrap_or(head).to_string()
}

/// An event-sourced aggregate root.
///
/// Implementors embed an [`EntityBase`] (flattened into their serde form),
/// register their replayable commands in a [`HandlerTable`], and get the
/// whole record/replay/snapshot protocol as provided methods.
///
/// Command methods mutate fields directly and then call [`Entity::record`]
/// to capture the mutation. The same methods are what the handler table
/// calls during replay; `record`, `enqueue` and `emit` turn into no-ops while
/// replaying, so a handler never logs or notifies twice.
///
/// An instance is owned by one caller at a time; there is no internal locking.
pub trait Entity: Serialize + DeserializeOwned + Sized + 'static {
    type Id: EntityIdentity;

    fn base(&self) -> &EntityBase<Self::Id>;

    fn base_mut(&mut self) -> &mut EntityBase<Self::Id>;

    /// Replay dispatch table for this type.
    fn handlers() -> &'static HandlerTable<Self>;

    /// Scope stamped on this type's events.
    fn scope_name() -> String {
        short_type_name::<Self>()
    }

    /// Capture an already-applied mutation as a logged event.
    fn record<D: Serialize>(&mut self, cmd: &str, data: D) -> EntityResult<&mut Self> {
        if self.base().is_replaying() {
            tracing::trace!(scope = self.base().scope(), cmd, "record suppressed during replay");
            return Ok(self);
        }

        let data = serde_json::to_value(data)?;
        let event = EventEngine::make_event(self.base_mut(), cmd, data);
        EventEngine::apply_event(self, &event, ApplyMode::Live)?;

        tracing::debug!(
            scope = self.base().scope(),
            cmd,
            revision = self.base().revision(),
            "recorded event"
        );
        Ok(self)
    }

    /// Re-apply a previously recorded event without logging or emitting.
    fn replay(&mut self, event: &Event<Self::Id>) -> EntityResult<&mut Self> {
        let applied = EventEngine::apply_event(self, event, ApplyMode::Replay)?;
        tracing::debug!(
            scope = event.scope(),
            cmd = event.cmd(),
            revision = event.revision(),
            ?applied,
            "replayed event"
        );
        Ok(self)
    }

    /// Replay events in the given order.
    fn replay_all<'a, I>(&mut self, events: I) -> EntityResult<&mut Self>
    where
        I: IntoIterator<Item = &'a Event<Self::Id>>,
    {
        for event in events {
            self.replay(event)?;
        }
        Ok(self)
    }

    /// Merge a snapshot's fields back into this instance.
    ///
    /// The storage key under `_id` is not merged.
    fn restore(&mut self, snapshot: &Snapshot) -> EntityResult<&mut Self> {
        let fields = value::omit(snapshot.as_value(), PERSISTENCE_ID_FIELD)?;
        self.merge(fields)?;
        tracing::debug!(
            scope = self.base().scope(),
            revision = self.base().revision(),
            version = self.base().version(),
            "restored from snapshot"
        );
        Ok(self)
    }

    /// Recursively merge `data` into the entity's fields.
    ///
    /// Nested mappings merge; scalars and arrays are replaced. Keys that are
    /// not fields of the entity are dropped. The event log, queue, listeners
    /// and replay mode are untouched.
    fn merge<D: Serialize>(&mut self, data: D) -> EntityResult<&mut Self> {
        let data = serde_json::to_value(data)?;
        value::as_mapping("merge", &data)?;

        let mut state = serde_json::to_value(&*self)?;
        value::merge(&mut state, &data);

        let mut merged: Self = serde_json::from_value(state)?;
        std::mem::swap(&mut merged.base_mut().runtime, &mut self.base_mut().runtime);
        *self = merged;
        Ok(self)
    }

    /// Set `version` to the current revision and capture the full field set.
    fn snap(&mut self) -> EntityResult<Snapshot> {
        let base = self.base_mut();
        base.version = base.revision;

        let snapshot = Snapshot::capture(serde_json::to_value(&*self)?);
        tracing::debug!(
            scope = self.base().scope(),
            version = self.base().version(),
            "took snapshot"
        );
        Ok(snapshot)
    }

    /// Queue an outbound side effect.
    fn enqueue<P: Serialize>(&mut self, name: &str, payload: P) -> EntityResult<&mut Self> {
        if self.base().is_replaying() {
            return Ok(self);
        }

        let payload = serde_json::to_value(payload)?;
        self.base_mut()
            .runtime
            .queue
            .push(QueuedEffect::new(name, payload));
        tracing::debug!(scope = self.base().scope(), name, "enqueued side effect");
        Ok(self)
    }

    /// Keys of `data` whose value differs from the entity's current field.
    fn diff<D: Serialize>(&self, data: D) -> EntityResult<Map<String, Value>> {
        let current = serde_json::to_value(self)?;
        value::diff(&current, &serde_json::to_value(data)?)
    }

    /// Copy of `data` with an `operation` stamp of `{ts, revision, version}`.
    ///
    /// A `null` payload yields just the stamp.
    fn op<D: Serialize>(&self, data: D) -> EntityResult<Value> {
        let data = serde_json::to_value(data)?;
        let mut out = match data {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => return Err(EntityError::not_a_mapping("op", &other)),
        };

        let base = self.base();
        out.insert(
            "operation".to_string(),
            json!({
                "ts": base.ts().timestamp_millis(),
                "revision": base.revision(),
                "version": base.version(),
            }),
        );
        Ok(Value::Object(out))
    }

    /// Notify listeners of `name`, unless replaying.
    fn emit(&mut self, name: &str, payload: &Value) -> &mut Self {
        if self.base().is_replaying() {
            tracing::trace!(scope = self.base().scope(), name, "emit suppressed during replay");
            return self;
        }
        self.base_mut().runtime.emitter.emit(name, payload);
        self
    }

    /// Register a listener on this entity's notifications.
    fn on<F>(&mut self, name: &str, listener: F) -> ListenerId
    where
        F: FnMut(&Value) + Send + 'static,
    {
        self.base_mut().runtime.emitter.on(name, listener)
    }

    /// Unregister a listener added with [`Entity::on`].
    fn off(&mut self, listener: ListenerId) -> bool {
        self.base_mut().runtime.emitter.off(listener)
    }

    /// `record(cmd, data)` then `enqueue(event, op(result))`; hands back `result`.
    fn record_and_enqueue<D, R>(&mut self, cmd: &str, event: &str, data: D, result: R) -> EntityResult<R>
    where
        D: Serialize,
        R: Serialize,
    {
        self.record(cmd, data)?;
        let stamped = self.op(&result)?;
        self.enqueue(event, stamped)?;
        Ok(result)
    }

    /// Hand the live event log to a storage collaborator.
    fn take_events(&mut self) -> Vec<Event<Self::Id>> {
        std::mem::take(&mut self.base_mut().runtime.events)
    }

    /// Hand the pending side effects to a delivery collaborator.
    fn take_queue(&mut self) -> Vec<QueuedEffect> {
        std::mem::take(&mut self.base_mut().runtime.queue)
    }
}

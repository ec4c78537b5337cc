use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use sourced_core::{EntityError, EntityResult};

type BoxedHandler<E> = Box<dyn Fn(&mut E, &Value) -> EntityResult<()> + Send + Sync>;

/// Command dispatch table for one concrete entity type.
///
/// Maps a command name (the `cmd` stamped on events) to the handler that
/// re-applies it during replay. Replay looks commands up here; a command with
/// no entry is skipped.
///
/// ```ignore
/// fn handlers() -> &'static HandlerTable<Self> {
///     static HANDLERS: OnceLock<HandlerTable<Order>> = OnceLock::new();
///     HANDLERS.get_or_init(|| {
///         HandlerTable::new()
///             .on("start", |order: &mut Order, data: StartData| order.start(data).map(drop))
///     })
/// }
/// ```
pub struct HandlerTable<E> {
    handlers: HashMap<String, BoxedHandler<E>>,
}

impl<E> HandlerTable<E> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a typed handler; the event payload is deserialized into `D`.
    pub fn on<D, F>(self, cmd: impl Into<String>, handler: F) -> Self
    where
        D: DeserializeOwned,
        F: Fn(&mut E, D) -> EntityResult<()> + Send + Sync + 'static,
    {
        let cmd = cmd.into();
        let name = cmd.clone();
        self.on_raw(cmd, move |entity, data| {
            let data = D::deserialize(data).map_err(|e| EntityError::handler(&name, e.to_string()))?;
            handler(entity, data)
        })
    }

    /// Register a handler that takes the payload as-is.
    pub fn on_raw<F>(mut self, cmd: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut E, &Value) -> EntityResult<()> + Send + Sync + 'static,
    {
        self.handlers.insert(cmd.into(), Box::new(handler));
        self
    }

    pub fn contains(&self, cmd: &str) -> bool {
        self.handlers.contains_key(cmd)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn get(&self, cmd: &str) -> Option<&BoxedHandler<E>> {
        self.handlers.get(cmd)
    }
}

impl<E> Default for HandlerTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> core::fmt::Debug for HandlerTable<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut commands: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        commands.sort_unstable();
        f.debug_struct("HandlerTable").field("commands", &commands).finish()
    }
}

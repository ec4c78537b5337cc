//! Named-notification emitter (observer mechanics only).
//!
//! Listeners register for a notification name and are called synchronously,
//! in registration order, whenever that name is emitted. Whether a given
//! entity *should* emit is decided by the entity, not here.

use serde_json::Value;

/// Notification channel used to report errors.
pub const ERROR_CHANNEL: &str = "error";

/// Handle returned by [`Emitter::on`], used to unregister a listener.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&Value) + Send>;

struct Registration {
    id: ListenerId,
    name: String,
    once: bool,
    listener: Listener,
}

/// In-process pub/sub registry.
///
/// - No IO / no async
/// - Synchronous fan-out in registration order
#[derive(Default)]
pub struct Emitter {
    registrations: Vec<Registration>,
    next_id: u64,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for every `name` notification.
    pub fn on<F>(&mut self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: FnMut(&Value) + Send + 'static,
    {
        self.register(name.into(), false, Box::new(listener))
    }

    /// Register `listener` for the next `name` notification only.
    pub fn once<F>(&mut self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: FnMut(&Value) + Send + 'static,
    {
        self.register(name.into(), true, Box::new(listener))
    }

    /// Unregister a listener. Returns `false` if it was already gone.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        self.registrations.len() != before
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.registrations.iter().filter(|r| r.name == name).count()
    }

    /// Deliver `payload` to every listener of `name`.
    ///
    /// Returns whether anyone was listening.
    pub fn emit(&mut self, name: &str, payload: &Value) -> bool {
        let mut delivered = false;
        for registration in self.registrations.iter_mut().filter(|r| r.name == name) {
            (registration.listener)(payload);
            delivered = true;
        }

        // One-shot listeners are dropped after delivery.
        if delivered {
            self.registrations.retain(|r| !(r.once && r.name == name));
        }

        delivered
    }

    fn register(&mut self, name: String, once: bool, listener: Listener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.registrations.push(Registration {
            id,
            name,
            once,
            listener,
        });
        id
    }
}

impl core::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.registrations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&'static str) -> Box<dyn FnMut(&Value) + Send>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |tag: &'static str| -> Box<dyn FnMut(&Value) + Send> {
            let sink = sink.clone();
            Box::new(move |payload: &Value| {
                sink.lock().unwrap().push(format!("{tag}:{payload}"));
            })
        };
        (log, make)
    }

    #[test]
    fn delivers_in_registration_order() {
        let (log, make) = recorder();
        let mut emitter = Emitter::new();
        emitter.on("started", make("first"));
        emitter.on("started", make("second"));
        emitter.on("ended", make("other"));

        assert!(emitter.emit("started", &json!(1)));
        assert_eq!(*log.lock().unwrap(), vec!["first:1", "second:1"]);
    }

    #[test]
    fn emit_without_listeners_reports_false() {
        let mut emitter = Emitter::new();
        assert!(!emitter.emit("nobody", &Value::Null));
    }

    #[test]
    fn once_listeners_fire_a_single_time() {
        let (log, make) = recorder();
        let mut emitter = Emitter::new();
        emitter.once("started", make("once"));

        emitter.emit("started", &json!("a"));
        emitter.emit("started", &json!("b"));

        assert_eq!(*log.lock().unwrap(), vec!["once:\"a\""]);
        assert_eq!(emitter.listener_count("started"), 0);
    }

    #[test]
    fn off_unregisters() {
        let (log, make) = recorder();
        let mut emitter = Emitter::new();
        let id = emitter.on("started", make("gone"));

        assert!(emitter.off(id));
        assert!(!emitter.off(id));
        emitter.emit("started", &Value::Null);
        assert!(log.lock().unwrap().is_empty());
    }
}

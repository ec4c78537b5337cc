use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound side effect waiting for external delivery.
///
/// Entities only append these; draining and delivering them is up to the
/// caller (e.g. after the recorded events have been persisted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedEffect {
    name: String,
    payload: Value,
}

impl QueuedEffect {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_parts(self) -> (String, Value) {
        (self.name, self.payload)
    }
}

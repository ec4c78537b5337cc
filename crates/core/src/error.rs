//! Entity error model.

use thiserror::Error;

/// Result type used across the entity layer.
pub type EntityResult<T> = Result<T, EntityError>;

/// Entity-level error.
///
/// All failures are synchronous and surface to the caller. Replaying an event
/// whose command has no registered handler is *not* an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityError {
    /// The abstract base was constructed without a concrete entity type.
    #[error("Can not instantiate abstract class.")]
    AbstractInstantiation { scope: String },

    /// A payload or entity state could not be converted to/from its structural form.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// An operation that works on mappings was handed something else.
    #[error("{operation} expects a mapping, found {found}")]
    NotAMapping {
        operation: &'static str,
        found: &'static str,
    },

    /// A command handler failed while an event was being replayed.
    #[error("handler for '{cmd}' failed: {message}")]
    Handler { cmd: String, message: String },
}

impl EntityError {
    pub fn abstract_instantiation(scope: impl Into<String>) -> Self {
        Self::AbstractInstantiation {
            scope: scope.into(),
        }
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn not_a_mapping(operation: &'static str, found: &serde_json::Value) -> Self {
        Self::NotAMapping {
            operation,
            found: kind_of(found),
        }
    }

    pub fn handler(cmd: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Handler {
            cmd: cmd.into(),
            message: msg.into(),
        }
    }
}

impl From<serde_json::Error> for EntityError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use sourced_core::{EntityResult, value};

/// Field a storage layer may use for its own record key.
///
/// It is distinct from the entity's `id` and never merged back by `restore`.
pub const PERSISTENCE_ID_FIELD: &str = "_id";

/// Frozen capture of an entity's full field set.
///
/// Produced by `Entity::snap`, consumed by `Entity::restore`. Holds the
/// serialized entity (base fields plus the concrete type's own fields) with
/// `version` equal to the revision at capture time. Runtime state (event log,
/// queue, listeners, replay mode) is never captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    state: Value,
}

impl Snapshot {
    pub(crate) fn capture(state: Value) -> Self {
        Self { state }
    }

    /// Wrap a snapshot loaded from storage.
    pub fn from_value(state: Value) -> EntityResult<Self> {
        value::as_mapping("snapshot", &state)?;
        Ok(Self { state })
    }

    /// Attach a storage key under [`PERSISTENCE_ID_FIELD`].
    pub fn with_persistence_id(self, key: impl Serialize) -> EntityResult<Self> {
        let mut state = self.state;
        let key = serde_json::to_value(key)?;
        if let Value::Object(map) = &mut state {
            map.insert(PERSISTENCE_ID_FIELD.to_string(), key);
        }
        Ok(Self { state })
    }

    pub fn as_value(&self) -> &Value {
        &self.state
    }

    pub fn into_value(self) -> Value {
        self.state
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.state.get(field)
    }

    /// Entity identity captured in the snapshot.
    pub fn id<Id: DeserializeOwned>(&self) -> EntityResult<Id> {
        Ok(Id::deserialize(self.field("id"))?)
    }

    pub fn persistence_id(&self) -> Option<&Value> {
        self.get(PERSISTENCE_ID_FIELD)
    }

    pub fn scope(&self) -> Option<&str> {
        self.get("scope").and_then(Value::as_str)
    }

    pub fn version(&self) -> u64 {
        self.get("version").and_then(Value::as_u64).unwrap_or(0)
    }

    pub fn revision(&self) -> u64 {
        self.get("revision").and_then(Value::as_u64).unwrap_or(0)
    }

    pub fn ts(&self) -> Option<DateTime<Utc>> {
        self.get("ts")
            .and_then(Value::as_i64)
            .and_then(DateTime::from_timestamp_millis)
    }

    fn field(&self, name: &str) -> &Value {
        self.get(name).unwrap_or(&Value::Null)
    }
}

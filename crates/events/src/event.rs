use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A recorded command application.
///
/// Events are:
/// - **immutable** (no mutating accessors; treat them as facts)
/// - **stamped** with the producing entity's `id`, `ts`, `scope`, `version`
///   and `revision` at creation time
/// - the unit a storage collaborator persists and later feeds to `replay`
///
/// Serialized layout: `{cmd, data, id, ts, scope, version, revision}` with
/// `ts` as integer milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<Id> {
    cmd: String,
    #[serde(default)]
    data: Value,
    id: Id,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    ts: DateTime<Utc>,
    scope: String,
    #[serde(default)]
    version: u64,
    revision: u64,
}

impl<Id> Event<Id> {
    /// Rebuild an event from its parts.
    ///
    /// Live events come from `EventEngine::make_event`; this constructor is
    /// for storage layers and fixtures that already hold a stamped event.
    pub fn new(
        cmd: impl Into<String>,
        data: Value,
        id: Id,
        ts: DateTime<Utc>,
        scope: impl Into<String>,
        version: u64,
        revision: u64,
    ) -> Self {
        Self {
            cmd: cmd.into(),
            data,
            id,
            ts,
            scope: scope.into(),
            version,
            revision,
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn ts(&self) -> DateTime<Utc> {
        self.ts
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn into_data(self) -> Value {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_the_stored_layout() {
        let event: Event<u64> = serde_json::from_value(json!({
            "cmd": "start",
            "data": { "agent": "tomas" },
            "id": 1,
            "revision": 1,
            "ts": 1442799956314i64,
            "scope": "TestEntity"
        }))
        .unwrap();

        assert_eq!(event.cmd(), "start");
        assert_eq!(event.data(), &json!({ "agent": "tomas" }));
        assert_eq!(event.ts().timestamp_millis(), 1442799956314);
        assert_eq!(event.version(), 0);
        assert_eq!(event.revision(), 1);
    }

    #[test]
    fn serializes_ts_as_integer_millis() {
        let ts = DateTime::from_timestamp_millis(1442799956315).unwrap();
        let event = Event::new("end", json!({ "agent": "mery" }), 7u64, ts, "TestEntity", 0, 2);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["ts"], json!(1442799956315i64));
        assert_eq!(value["cmd"], json!("end"));
        assert_eq!(value["id"], json!(7));
    }
}

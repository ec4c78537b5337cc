//! Identifiers.

use core::str::FromStr;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::error::EntityError;

/// Bound for anything usable as an entity identity.
///
/// Identities are consumer-assigned. They get copied onto every event and
/// into every snapshot, so they must round-trip through serde.
pub trait EntityIdentity:
    Clone + PartialEq + core::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> EntityIdentity for T where
    T: Clone + PartialEq + core::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Ready-made entity identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
    /// for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for EntityId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<EntityId> for Uuid {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl FromStr for EntityId {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| EntityError::serialization(format!("EntityId: {e}")))?;
        Ok(Self(uuid))
    }
}

//! Entity identifiers and `(type, id)` references.
//!
//! # Responsibility
//! - Wrap opaque identity values and derive a content-stable canonical key.
//! - Name a persisted entity independently of any in-memory instance.
//!
//! # Invariants
//! - The canonical key is the SHA-256 hex digest of the id's compact JSON text,
//!   so structurally equal ids collide even when built separately.
//! - `Reference` equality, ordering and hashing use `(entity_type, digest)` only.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Opaque identity value unique within one entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Value);

impl EntityId {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Builds an id from any serializable value, e.g. a composite key struct.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Returns the string payload when the id is a JSON string.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Content-stable digest used as identity-map and storage key.
    pub fn canonical(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Value::String(value) => f.write_str(value),
            other => write!(f, "{other}"),
        }
    }
}

impl From<Value> for EntityId {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(Value::String(value))
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self(Value::from(value))
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(Value::from(value))
    }
}

impl From<i32> for EntityId {
    fn from(value: i32) -> Self {
        Self(Value::from(value))
    }
}

impl From<u32> for EntityId {
    fn from(value: u32) -> Self {
        Self(Value::from(value))
    }
}

impl From<Uuid> for EntityId {
    fn from(value: Uuid) -> Self {
        Self(Value::String(value.to_string()))
    }
}

/// Stable name of one persisted entity: runtime type plus identity value.
///
/// Created fresh on every resolution and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ReferenceRecord", into = "ReferenceRecord")]
pub struct Reference {
    entity_type: String,
    id: EntityId,
    digest: String,
}

impl Reference {
    pub fn new(entity_type: impl Into<String>, id: impl Into<EntityId>) -> Self {
        let id = id.into();
        let digest = id.canonical();
        Self {
            entity_type: entity_type.into(),
            id,
            digest,
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Canonical id digest, see [`EntityId::canonical`].
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.entity_type == other.entity_type && self.digest == other.digest
    }
}

impl Eq for Reference {}

impl Hash for Reference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity_type.hash(state);
        self.digest.hash(state);
    }
}

impl PartialOrd for Reference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Reference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.entity_type
            .cmp(&other.entity_type)
            .then_with(|| self.digest.cmp(&other.digest))
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.id)
    }
}

/// Serialized shape of a reference; the digest is recomputed on read.
#[derive(Serialize, Deserialize)]
struct ReferenceRecord {
    #[serde(rename = "type")]
    entity_type: String,
    id: EntityId,
}

impl From<ReferenceRecord> for Reference {
    fn from(value: ReferenceRecord) -> Self {
        Self::new(value.entity_type, value.id)
    }
}

impl From<Reference> for ReferenceRecord {
    fn from(value: Reference) -> Self {
        Self {
            entity_type: value.entity_type,
            id: value.id,
        }
    }
}

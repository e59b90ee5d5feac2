mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use local::LocalStore;

use crate::object::{ChannelId, NewObject, StoredObject};
use crate::schema::Schema;
use crate::session::Session;

pub type StoreResult<T> = Result<T, StoreError>;

/// Transport-level failure reported by a store backend.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct StoreError(#[from] pub anyhow::Error);

/// One step of a JSON Patch against an object's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: Value },
    Replace { path: String, value: Value },
    Remove { path: String },
}

/// A patch addressed at an object's value, the shape the store's wire
/// protocol carries it in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuePatch {
    pub value: Vec<PatchOp>,
}

impl ValuePatch {
    pub fn single(op: PatchOp) -> Self {
        Self { value: vec![op] }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self::single(PatchOp::Replace { path: path.into(), value })
    }
}

/// The poll-only object store the client reconciles against. No
/// pushes, no ordering promises, no read-your-writes guarantee beyond
/// what a single backend happens to give.
#[async_trait]
pub trait ObjectStore {
    /// Store a new object in the given channels, owned by the
    /// session's actor. Returns the object as stored, url assigned.
    async fn put(&self, new: NewObject, session: &Session) -> StoreResult<StoredObject>;

    /// Apply a patch to an object the session's actor owns.
    async fn patch(
        &self,
        patch: &ValuePatch,
        target: &StoredObject,
        session: &Session,
    ) -> StoreResult<()>;

    /// Remove an object the session's actor owns.
    async fn delete(&self, target: &StoredObject, session: &Session) -> StoreResult<()>;

    /// All objects reachable through any of `channels` whose value
    /// matches `schema`, in no particular order.
    async fn discover(
        &self,
        channels: &[ChannelId],
        schema: &Schema,
    ) -> StoreResult<Vec<StoredObject>>;
}

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::object::{ChannelId, NewObject, ObjectUrl, StoredObject};
use crate::schema::Schema;
use crate::session::Session;
use crate::store::{ObjectStore, PatchOp, StoreResult, ValuePatch};

/// In-process store backend. Shares one object table across clones,
/// so several clients can reconcile against the same state. Returns
/// discovery results in insertion order, which is not publication
/// order.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    objects: Vec<StoredObject>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().objects.is_empty()
    }

    pub fn object(&self, url: &str) -> Option<StoredObject> {
        self.lock().objects.iter().find(|o| o.url == url).cloned()
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(&self, new: NewObject, session: &Session) -> StoreResult<StoredObject> {
        let object = StoredObject {
            url: mint_url(),
            value: new.value,
            channels: new.channels,
            actor: session.actor.clone(),
        };
        self.lock().objects.push(object.clone());
        Ok(object)
    }

    async fn patch(
        &self,
        patch: &ValuePatch,
        target: &StoredObject,
        session: &Session,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        let object = inner
            .objects
            .iter_mut()
            .find(|o| o.url == target.url)
            .ok_or_else(|| anyhow!("no object at {}", target.url))?;
        if object.actor != session.actor {
            return Err(anyhow!("only the owner may patch {}", target.url).into());
        }
        // All ops land or none do.
        let mut value = object.value.clone();
        for op in &patch.value {
            apply_op(&mut value, op)?;
        }
        object.value = value;
        Ok(())
    }

    async fn delete(&self, target: &StoredObject, session: &Session) -> StoreResult<()> {
        let mut inner = self.lock();
        let at = inner
            .objects
            .iter()
            .position(|o| o.url == target.url)
            .ok_or_else(|| anyhow!("no object at {}", target.url))?;
        if inner.objects[at].actor != session.actor {
            return Err(anyhow!("only the owner may delete {}", target.url).into());
        }
        inner.objects.remove(at);
        Ok(())
    }

    async fn discover(
        &self,
        channels: &[ChannelId],
        schema: &Schema,
    ) -> StoreResult<Vec<StoredObject>> {
        let inner = self.lock();
        Ok(inner
            .objects
            .iter()
            .filter(|o| o.shares_channel(channels) && schema.matches(&o.value))
            .cloned()
            .collect())
    }
}

fn mint_url() -> ObjectUrl {
    format!("local://{}", Uuid::now_v7())
}

fn apply_op(value: &mut Value, op: &PatchOp) -> anyhow::Result<()> {
    match op {
        PatchOp::Replace { path, value: new } => {
            let slot = value
                .pointer_mut(path)
                .ok_or_else(|| anyhow!("no value at {path}"))?;
            *slot = new.clone();
        }
        PatchOp::Add { path, value: new } => {
            let (parent_path, key) = split_path(path)?;
            let parent = value
                .pointer_mut(parent_path)
                .and_then(Value::as_object_mut)
                .ok_or_else(|| anyhow!("no object at {parent_path}"))?;
            parent.insert(key.to_owned(), new.clone());
        }
        PatchOp::Remove { path } => {
            let (parent_path, key) = split_path(path)?;
            let parent = value
                .pointer_mut(parent_path)
                .and_then(Value::as_object_mut)
                .ok_or_else(|| anyhow!("no object at {parent_path}"))?;
            parent
                .remove(key)
                .ok_or_else(|| anyhow!("no value at {path}"))?;
        }
    }
    Ok(())
}

fn split_path(path: &str) -> anyhow::Result<(&str, &str)> {
    if !path.starts_with('/') {
        return Err(anyhow!("malformed patch path {path}"));
    }
    path.rsplit_once('/')
        .ok_or_else(|| anyhow!("malformed patch path {path}"))
}

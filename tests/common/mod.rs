#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use loudwhispers::object::{ChannelId, NewObject, StoredObject};
use loudwhispers::schema::Schema;
use loudwhispers::store::{StoreResult, ValuePatch};
use loudwhispers::{LocalStore, ObjectStore, Session, StoreError};

pub const ALICE: &str = "https://pods.example/u/alice";
pub const BOB: &str = "https://pods.example/u/bob";

pub fn session(actor: &str) -> Session {
    Session::new(actor)
}

/// Put a raw message value, bypassing the client, so tests can craft
/// timestamps the coordinator would otherwise stamp itself.
pub async fn seed_message(
    store: &LocalStore,
    channel: &str,
    actor: &str,
    content: &str,
    published: i64,
) -> StoredObject {
    let value = json!({ "content": content, "published": published });
    seed_value(store, channel, actor, value).await
}

pub async fn seed_overlay(
    store: &LocalStore,
    channel: &str,
    actor: &str,
    name: &str,
    published: i64,
) -> StoredObject {
    let value = json!({ "name": name, "describes": channel, "published": published });
    seed_value(store, channel, actor, value).await
}

pub async fn seed_value(
    store: &LocalStore,
    channel: &str,
    actor: &str,
    value: Value,
) -> StoredObject {
    store
        .put(
            NewObject::new(value, vec![channel.to_owned()]),
            &session(actor),
        )
        .await
        .unwrap()
}

/// LocalStore wrapper whose failure switches can be thrown mid-test,
/// for exercising the refused-write and failed-refresh paths.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: LocalStore,
    reads_fail: Arc<AtomicBool>,
    writes_fail: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.reads_fail.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.writes_fail.store(fail, Ordering::SeqCst);
    }

    fn read_gate(&self) -> StoreResult<()> {
        if self.reads_fail.load(Ordering::SeqCst) {
            return Err(StoreError(anyhow::anyhow!("injected read failure")));
        }
        Ok(())
    }

    fn write_gate(&self) -> StoreResult<()> {
        if self.writes_fail.load(Ordering::SeqCst) {
            return Err(StoreError(anyhow::anyhow!("injected write failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FlakyStore {
    async fn put(&self, new: NewObject, session: &Session) -> StoreResult<StoredObject> {
        self.write_gate()?;
        self.inner.put(new, session).await
    }

    async fn patch(
        &self,
        patch: &ValuePatch,
        target: &StoredObject,
        session: &Session,
    ) -> StoreResult<()> {
        self.write_gate()?;
        self.inner.patch(patch, target, session).await
    }

    async fn delete(&self, target: &StoredObject, session: &Session) -> StoreResult<()> {
        self.write_gate()?;
        self.inner.delete(target, session).await
    }

    async fn discover(
        &self,
        channels: &[ChannelId],
        schema: &Schema,
    ) -> StoreResult<Vec<StoredObject>> {
        self.read_gate()?;
        self.inner.discover(channels, schema).await
    }
}

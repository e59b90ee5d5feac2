use std::cmp::Reverse;

use serde_json::Value;
use tracing::debug;

use crate::object::{ChannelId, StoredObject, now_ms};
use crate::schema::{Schema, View};
use crate::store::StoreResult;
use crate::{AppError, AppResult};

/// What a cache is showing: which channels, through which view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub channels: Vec<ChannelId>,
    pub view: View,
}

impl CacheKey {
    pub fn new(channels: Vec<ChannelId>, view: View) -> Self {
        Self { channels, view }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Came back from a store refresh.
    Committed,
    /// Inserted locally after a confirmed mutation; stands in until
    /// the next refresh returns it for real.
    Provisional,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub object: StoredObject,
    pub state: EntryState,
}

/// Proof that a refresh was begun against the cache's current target.
/// Tickets from before a retarget no longer land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

/// One view's local replica: a descending-by-`published` snapshot of
/// whatever the store last returned, plus optimistic edits layered on
/// top between refreshes.
#[derive(Debug)]
pub struct TimelineCache {
    key: CacheKey,
    schema: Schema,
    entries: Vec<CacheEntry>,
    generation: u64,
    inflight: Option<u64>,
    last_updated: Option<i64>,
}

impl TimelineCache {
    pub fn new(key: CacheKey) -> Self {
        let schema = key.view.schema();
        Self {
            key,
            schema,
            entries: Vec::new(),
            generation: 0,
            inflight: None,
            last_updated: None,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    pub fn objects(&self) -> impl Iterator<Item = &StoredObject> {
        self.entries.iter().map(|entry| &entry.object)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time of the last refresh that landed, ms since epoch.
    pub fn last_updated(&self) -> Option<i64> {
        self.last_updated
    }

    /// Point the cache at a new target. The snapshot is dropped and
    /// any refresh still in flight is retired with it. Retargeting to
    /// the current key is a no-op.
    pub fn retarget(&mut self, key: CacheKey) {
        if key == self.key {
            return;
        }
        debug!(view = ?key.view, channels = ?key.channels, "cache retargeted");
        self.schema = key.view.schema();
        self.key = key;
        self.entries.clear();
        self.generation += 1;
        self.inflight = None;
        self.last_updated = None;
    }

    /// Start a refresh, or return None when one is already underway
    /// for this target and the new request should coalesce into it.
    pub fn begin_refresh(&mut self) -> Option<RefreshTicket> {
        if self.inflight == Some(self.generation) {
            return None;
        }
        self.inflight = Some(self.generation);
        Some(RefreshTicket { generation: self.generation })
    }

    /// Land a finished refresh. Stale tickets answer a target that is
    /// no longer shown, so their rows and their errors are discarded;
    /// returns Ok(false) for those, Ok(true) when the snapshot was
    /// replaced.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: StoreResult<Vec<StoredObject>>,
    ) -> AppResult<bool> {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding refresh for a retired cache target"
            );
            return Ok(false);
        }
        self.inflight = None;
        let objects = result.map_err(AppError::RefreshFailed)?;
        self.entries = reconcile(objects);
        self.last_updated = Some(now_ms());
        Ok(true)
    }

    /// Optimistic insert at its timestamp position. Ignored when the
    /// object doesn't belong to this cache's channels or view.
    pub fn apply_put(&mut self, object: StoredObject) -> bool {
        if !object.shares_channel(&self.key.channels) || !self.schema.matches(&object.value) {
            return false;
        }
        let at = insertion_index(&self.entries, object.published());
        let entry = CacheEntry { object, state: EntryState::Provisional };
        self.entries.insert(at, entry);
        true
    }

    /// Optimistic value swap for the entry at `url`, if cached.
    pub fn apply_patch(&mut self, url: &str, value: Value) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.object.url == url) else {
            return false;
        };
        entry.object.value = value;
        entry.state = EntryState::Provisional;
        true
    }

    /// Optimistic removal of the entry at `url`, if cached.
    pub fn apply_remove(&mut self, url: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.object.url != url);
        self.entries.len() != before
    }
}

/// Wholesale ordering pass over a refresh result: newest first, equal
/// timestamps kept in arrival order.
pub(crate) fn reconcile(objects: Vec<StoredObject>) -> Vec<CacheEntry> {
    let mut entries: Vec<CacheEntry> = objects
        .into_iter()
        .map(|object| CacheEntry { object, state: EntryState::Committed })
        .collect();
    entries.sort_by_key(|entry| Reverse(entry.object.published()));
    entries
}

/// First index whose entry is strictly older, so an equal timestamp
/// lands after everything already holding it.
fn insertion_index(entries: &[CacheEntry], published: i64) -> usize {
    entries
        .iter()
        .position(|entry| entry.object.published() < published)
        .unwrap_or(entries.len())
}

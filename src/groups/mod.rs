mod msg;
mod navigator;
mod overlay;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use msg::{Message, TimelineMessage, likes_of, toggled};
pub use navigator::{GroupNavigator, Location};
pub use overlay::{NameOverlay, collect_overlays, resolve_name};

use crate::object::{ActorId, ChannelId, ObjectUrl, StoredObject, now_ms};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activity {
    Create,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    Group,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInfo {
    #[serde(rename = "type")]
    pub kind: GroupKind,
    pub name: String,
    pub channel: ChannelId,
}

/// The durable record announcing a group: who made it, what it was
/// first called, which channel its traffic lives in. Renames never
/// touch this record; they ride as overlays in the group's channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub activity: Activity,
    pub object: GroupInfo,
    pub published: i64,
}

impl GroupRecord {
    /// Fresh record with a newly minted channel id.
    pub fn create(name: impl Into<String>) -> Self {
        Self {
            activity: Activity::Create,
            object: GroupInfo {
                kind: GroupKind::Group,
                name: name.into(),
                channel: Uuid::now_v7().to_string(),
            },
            published: now_ms(),
        }
    }
}

/// A group as discovered: the creation record plus where it sits in
/// the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub url: ObjectUrl,
    pub actor: ActorId,
    pub record: GroupRecord,
}

impl Group {
    /// Parse a discovered object as a group. Objects that slipped the
    /// listing predicate but still don't decode are dropped, not
    /// surfaced as errors.
    pub fn from_object(object: &StoredObject) -> Option<Self> {
        let record = serde_json::from_value(object.value.clone()).ok()?;
        Some(Self {
            url: object.url.clone(),
            actor: object.actor.clone(),
            record,
        })
    }

    pub fn name(&self) -> &str {
        &self.record.object.name
    }

    pub fn channel(&self) -> &ChannelId {
        &self.record.object.channel
    }
}

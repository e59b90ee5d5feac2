use serde::{Deserialize, Serialize};

use crate::object::{ChannelId, StoredObject, now_ms};

use super::GroupRecord;

/// A rename rider. Immutable once put; a newer overlay supersedes it
/// rather than editing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameOverlay {
    pub name: String,
    pub describes: ChannelId,
    pub published: i64,
}

impl NameOverlay {
    pub fn new(name: impl Into<String>, describes: impl Into<ChannelId>) -> Self {
        Self {
            name: name.into(),
            describes: describes.into(),
            published: now_ms(),
        }
    }
}

/// The overlays hiding in a pile of discovered objects, sequence order
/// preserved. Values without the overlay shape are passed over.
pub fn collect_overlays<'a>(objects: impl Iterator<Item = &'a StoredObject>) -> Vec<NameOverlay> {
    objects
        .filter_map(|object| serde_json::from_value(object.value.clone()).ok())
        .collect()
}

/// Latest-wins fold over a group's overlays: the greatest `published`
/// names the group, the later of two exact ties wins, and no overlay
/// at all leaves the creation-record name standing.
pub fn resolve_name<'a>(creation: &'a GroupRecord, overlays: &'a [NameOverlay]) -> &'a str {
    let mut winner: Option<&NameOverlay> = None;
    for overlay in overlays {
        if overlay.describes != creation.object.channel {
            continue;
        }
        if winner.is_none_or(|w| overlay.published >= w.published) {
            winner = Some(overlay);
        }
    }
    match winner {
        Some(overlay) => &overlay.name,
        None => &creation.object.name,
    }
}

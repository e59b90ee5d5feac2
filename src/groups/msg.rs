use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::object::{ActorId, StoredObject};

/// A message value as published: text, a voice clip, or both slots
/// with one filled. `likes` appears once somebody has toggled it on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    pub published: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<Vec<ActorId>>,
}

impl Message {
    pub fn text(content: impl Into<String>, published: i64) -> Self {
        Self {
            content: Some(content.into()),
            audio: None,
            published,
            likes: None,
        }
    }

    pub fn voice(audio_data_url: impl Into<String>, published: i64) -> Self {
        Self {
            content: None,
            audio: Some(audio_data_url.into()),
            published,
            likes: None,
        }
    }

    pub fn like_count(&self) -> usize {
        self.likes.as_ref().map(Vec::len).unwrap_or(0)
    }

    pub fn liked_by(&self, actor: &str) -> bool {
        self.likes
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .any(|a| a == actor)
    }
}

/// A timeline row: the stored object paired with its decoded body.
/// Name overlays share the timeline's channel and predicate but have
/// neither content nor audio, so they never become one of these.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineMessage {
    pub object: StoredObject,
    pub body: Message,
}

impl TimelineMessage {
    pub fn from_object(object: &StoredObject) -> Option<Self> {
        let body: Message = serde_json::from_value(object.value.clone()).ok()?;
        if body.content.is_none() && body.audio.is_none() {
            return None;
        }
        Some(Self { object: object.clone(), body })
    }

    pub fn url(&self) -> &str {
        &self.object.url
    }

    pub fn sender(&self) -> &str {
        &self.object.actor
    }

    /// Filename to suggest when saving the voice clip.
    pub fn download_name(&self) -> Option<String> {
        self.body.audio.as_ref()?;
        let stem = self
            .object
            .url
            .rsplit('/')
            .next()
            .filter(|stem| !stem.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| self.body.published.to_string());
        Some(format!("audio-{stem}.webm"))
    }
}

/// Lenient read of the likes array off a raw message value.
pub fn likes_of(value: &Value) -> Vec<ActorId> {
    value
        .get("likes")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// The likes array after one actor toggles it: removed when present,
/// appended when absent.
pub fn toggled(current: &[ActorId], actor: &str) -> Vec<ActorId> {
    if current.iter().any(|a| a == actor) {
        current.iter().filter(|a| *a != actor).cloned().collect()
    } else {
        let mut next = current.to_vec();
        next.push(actor.to_owned());
        next
    }
}

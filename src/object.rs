use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::format_description;

pub type ActorId = String;
pub type ChannelId = String;
pub type ObjectUrl = String;

/// An object as the store holds it: opaque JSON value plus the routing
/// metadata the store keeps alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub url: ObjectUrl,
    pub value: Value,
    pub channels: Vec<ChannelId>,
    pub actor: ActorId,
}

impl StoredObject {
    /// Publication timestamp in ms since epoch. Objects without one
    /// sort as 0, last in a descending timeline.
    pub fn published(&self) -> i64 {
        self.value
            .get("published")
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    pub fn shares_channel(&self, channels: &[ChannelId]) -> bool {
        self.channels.iter().any(|c| channels.contains(c))
    }
}

/// A value on its way into the store. The store assigns the url and
/// records the putting session's actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewObject {
    pub value: Value,
    pub channels: Vec<ChannelId>,
}

impl NewObject {
    pub fn new(value: Value, channels: Vec<ChannelId>) -> Self {
        Self { value, channels }
    }
}

pub fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn format_timestamp(ms: i64) -> String {
    let Ok(stamp) = OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000) else {
        return "unknown time".to_owned();
    };
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    stamp
        .format(&format)
        .unwrap_or_else(|_| "unknown time".to_owned())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_published_sorts_as_zero() {
        let object = StoredObject {
            url: "local://x".into(),
            value: json!({"content": "hi"}),
            channels: vec!["c".into()],
            actor: "a".into(),
        };
        assert_eq!(object.published(), 0);
    }

    #[test]
    fn epoch_formats_round() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00");
    }
}

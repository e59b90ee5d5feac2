use serde::{Deserialize, Serialize};

use crate::object::StoredObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileKind {
    Profile,
}

/// An actor's self-description, published into their own channel.
/// Saving again puts a fresh record rather than editing the old one;
/// reads keep whichever is newest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "type")]
    pub kind: ProfileKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronouns: Option<String>,
    pub published: i64,
}

impl Profile {
    pub fn new(name: impl Into<String>, pronouns: Option<String>, published: i64) -> Self {
        Self {
            kind: ProfileKind::Profile,
            name: name.into(),
            pronouns,
            published,
        }
    }
}

/// Newest decodable profile in a pile of discovered objects. Later
/// arrivals win exact timestamp ties, mirroring how group names
/// resolve.
pub fn latest_profile<'a>(objects: impl Iterator<Item = &'a StoredObject>) -> Option<Profile> {
    let mut winner: Option<Profile> = None;
    for object in objects {
        let Ok(profile) = serde_json::from_value::<Profile>(object.value.clone()) else {
            continue;
        };
        if winner.as_ref().is_none_or(|w| profile.published >= w.published) {
            winner = Some(profile);
        }
    }
    winner
}

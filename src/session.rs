use serde::{Deserialize, Serialize};

use crate::object::ActorId;

/// A signed-in identity. Mutations carry one; discovery does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub actor: ActorId,
}

impl Session {
    pub fn new(actor: impl Into<ActorId>) -> Self {
        Self { actor: actor.into() }
    }

    pub fn username(&self) -> String {
        username(&self.actor)
    }
}

/// Short display handle for an actor id: the last path segment of a
/// URL-shaped id, or the trailing run after `/`, `:` or `#` otherwise.
pub fn username(actor: &str) -> String {
    if let Ok(url) = reqwest::Url::parse(actor) {
        // opaque schemes like did:web:alice have no path segments and
        // fall through to the split below
        if let Some(segments) = url.path_segments() {
            return match segments.rev().find(|segment| !segment.is_empty()) {
                Some(segment) => segment.to_owned(),
                None => actor.to_owned(),
            };
        }
    }

    let trimmed = actor.trim_end_matches(['/', '#']);
    match trimmed.rfind(['/', ':', '#']) {
        Some(at) if at + 1 < trimmed.len() => trimmed[at + 1..].to_owned(),
        _ if !trimmed.is_empty() => trimmed.to_owned(),
        _ => actor.to_owned(),
    }
}

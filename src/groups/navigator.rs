use tracing::debug;

use crate::cache::CacheKey;
use crate::object::ChannelId;
use crate::schema::View;

/// Where the client is looking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Browsing the lobby's group listing.
    Directory,
    /// Inside one group's timeline.
    InsideGroup { channel: ChannelId },
}

/// Two-state navigation: the directory, or inside exactly one group.
/// There is no stack; entering a group from inside another leaves the
/// first implicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNavigator {
    lobby: ChannelId,
    location: Location,
}

impl GroupNavigator {
    pub fn new(lobby: impl Into<ChannelId>) -> Self {
        Self {
            lobby: lobby.into(),
            location: Location::Directory,
        }
    }

    pub fn lobby(&self) -> &ChannelId {
        &self.lobby
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn current_channel(&self) -> Option<&ChannelId> {
        match &self.location {
            Location::Directory => None,
            Location::InsideGroup { channel } => Some(channel),
        }
    }

    pub fn directory_key(&self) -> CacheKey {
        CacheKey::new(vec![self.lobby.clone()], View::GroupListing)
    }

    /// Move inside a group. Returns the cache key its timeline should
    /// now track.
    pub fn enter_group(&mut self, channel: ChannelId) -> CacheKey {
        if let Location::InsideGroup { channel: previous } = &self.location {
            if *previous != channel {
                debug!(from = %previous, to = %channel, "switching groups directly");
            }
        }
        let key = CacheKey::new(vec![channel.clone()], View::Timeline);
        self.location = Location::InsideGroup { channel };
        key
    }

    pub fn exit_group(&mut self) {
        self.location = Location::Directory;
    }
}

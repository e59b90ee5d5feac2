use std::collections::HashMap;

use anyhow::anyhow;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::audio;
use crate::cache::{CacheKey, TimelineCache};
use crate::groups::{
    Group, GroupNavigator, GroupRecord, Location, Message, NameOverlay, TimelineMessage,
    collect_overlays, likes_of, resolve_name, toggled,
};
use crate::object::{ChannelId, NewObject, ObjectUrl, StoredObject, now_ms};
use crate::profiles::{Profile, latest_profile};
use crate::schema::View;
use crate::session::Session;
use crate::store::{ObjectStore, PatchOp, ValuePatch};
use crate::transcribe::Transcriber;
use crate::{AppError, AppResult};

/// Something a rendering layer would want to redraw for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    SessionChanged,
    LocationChanged,
    DirectoryChanged,
    TimelineChanged,
    ProfileChanged,
}

/// One user's reconciliation state against a store: the directory and
/// timeline replicas, where they are looking, and the session their
/// mutations ride on. Mutations go to the store first and touch local
/// state only once the store has said yes.
pub struct Client<S> {
    store: S,
    session: Option<Session>,
    navigator: GroupNavigator,
    directory: TimelineCache,
    timeline: TimelineCache,
    /// Freshest resolved name per channel, kept after leaving a group
    /// so the directory can keep showing it.
    names: HashMap<ChannelId, String>,
    profile: Option<Profile>,
    transcripts: HashMap<ObjectUrl, String>,
    transcriber: Option<Transcriber>,
    events: broadcast::Sender<ClientEvent>,
}

impl<S: ObjectStore> Client<S> {
    pub fn new(store: S, lobby: impl Into<ChannelId>) -> Self {
        let navigator = GroupNavigator::new(lobby);
        let directory = TimelineCache::new(navigator.directory_key());
        Self {
            store,
            session: None,
            navigator,
            directory,
            timeline: TimelineCache::new(idle_timeline()),
            names: HashMap::new(),
            profile: None,
            transcripts: HashMap::new(),
            transcriber: None,
            events: broadcast::channel(64).0,
        }
    }

    pub fn with_transcriber(mut self, transcriber: Transcriber) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn set_session(&mut self, session: Session) {
        info!("session for {}", session.username());
        self.session = Some(session);
        self.emit(ClientEvent::SessionChanged);
    }

    /// Drop the session and everything keyed to it. Replicas of public
    /// data stay; the profile does not.
    pub fn logout(&mut self) {
        self.session = None;
        self.profile = None;
        self.emit(ClientEvent::SessionChanged);
    }

    fn require_session(&self) -> AppResult<&Session> {
        self.session.as_ref().ok_or(AppError::Unauthenticated)
    }

    pub fn location(&self) -> &Location {
        self.navigator.location()
    }

    /// Step into a group and pull its timeline.
    pub async fn enter_group(&mut self, group: &Group) -> AppResult<()> {
        let key = self.navigator.enter_group(group.channel().clone());
        self.timeline.retarget(key);
        self.emit(ClientEvent::LocationChanged);
        self.refresh_timeline().await
    }

    /// Step back out to the directory and freshen the listing.
    pub async fn exit_group(&mut self) -> AppResult<()> {
        self.navigator.exit_group();
        self.timeline.retarget(idle_timeline());
        self.emit(ClientEvent::LocationChanged);
        self.refresh_groups().await
    }

    /// Ask the store for the directory again, wholesale. A call while
    /// one is already out coalesces into it.
    pub async fn refresh_groups(&mut self) -> AppResult<()> {
        let Some(ticket) = self.directory.begin_refresh() else {
            debug!("directory refresh already in flight");
            return Ok(());
        };
        let channels = self.directory.key().channels.clone();
        let result = self.store.discover(&channels, self.directory.schema()).await;
        let applied = self.directory.complete_refresh(ticket, result)?;
        if applied {
            self.emit(ClientEvent::DirectoryChanged);
        }
        Ok(())
    }

    /// Ask the store for the open group's timeline again. Outside a
    /// group there is nothing to refresh and this is a no-op.
    pub async fn refresh_timeline(&mut self) -> AppResult<()> {
        if self.navigator.current_channel().is_none() {
            debug!("no timeline to refresh outside a group");
            return Ok(());
        }
        let Some(ticket) = self.timeline.begin_refresh() else {
            debug!("timeline refresh already in flight");
            return Ok(());
        };
        let channels = self.timeline.key().channels.clone();
        let result = self.store.discover(&channels, self.timeline.schema()).await;
        let applied = self.timeline.complete_refresh(ticket, result)?;
        if applied {
            self.refresh_group_name();
            self.emit(ClientEvent::TimelineChanged);
        }
        Ok(())
    }

    /// Re-run the rename fold over the freshly read timeline and
    /// remember the answer for the directory.
    fn refresh_group_name(&mut self) {
        let Some(channel) = self.navigator.current_channel().cloned() else {
            return;
        };
        let Some(group) = self.group_in(&channel) else {
            return;
        };
        let overlays = collect_overlays(self.timeline.objects());
        let name = resolve_name(&group.record, &overlays).to_owned();
        self.names.insert(channel, name);
    }

    fn group_in(&self, channel: &str) -> Option<Group> {
        self.directory
            .objects()
            .filter_map(Group::from_object)
            .find(|group| group.channel() == channel)
    }

    /// The directory, newest creation first.
    pub fn groups(&self) -> Vec<Group> {
        self.directory
            .objects()
            .filter_map(Group::from_object)
            .collect()
    }

    /// The name to show for a group: the freshest rename fold this
    /// client has seen, or the creation name before any overlay has
    /// been read.
    pub fn display_name<'a>(&'a self, group: &'a Group) -> &'a str {
        match self.names.get(group.channel()) {
            Some(name) => name,
            None => group.name(),
        }
    }

    /// The open group's messages, newest first. Overlays ride the same
    /// channel but are not messages and don't show here.
    pub fn messages(&self) -> Vec<TimelineMessage> {
        self.timeline
            .objects()
            .filter_map(TimelineMessage::from_object)
            .collect()
    }

    /// When the surface currently in view last heard from the store.
    pub fn last_synced(&self) -> Option<i64> {
        match self.navigator.location() {
            Location::Directory => self.directory.last_updated(),
            Location::InsideGroup { .. } => self.timeline.last_updated(),
        }
    }

    /// Mint a group: a creation record put to the lobby, then straight
    /// into its empty timeline.
    pub async fn create_group(&mut self, name: &str) -> AppResult<Group> {
        let session = self.require_session()?.clone();
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("group name cannot be empty"));
        }

        let record = GroupRecord::create(name);
        let new = NewObject::new(encode(&record)?, vec![self.navigator.lobby().clone()]);
        let stored = self
            .store
            .put(new, &session)
            .await
            .map_err(AppError::OperationFailed)?;

        let group = Group {
            url: stored.url.clone(),
            actor: stored.actor.clone(),
            record,
        };
        self.directory.apply_put(stored);
        self.emit(ClientEvent::DirectoryChanged);
        self.enter_group(&group).await?;
        Ok(group)
    }

    /// Rename by overlay: a fresh record put into the group's own
    /// channel. The creation record is never touched, so renaming
    /// needs no ownership of the group.
    pub async fn rename_group(&mut self, group: &Group, new_name: &str) -> AppResult<()> {
        let session = self.require_session()?.clone();
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::InvalidInput("group name cannot be empty"));
        }

        let overlay = NameOverlay::new(new_name, group.channel().clone());
        let new = NewObject::new(encode(&overlay)?, vec![group.channel().clone()]);
        let stored = self
            .store
            .put(new, &session)
            .await
            .map_err(AppError::OperationFailed)?;

        let in_open_timeline = self.timeline.apply_put(stored);
        self.names.insert(group.channel().clone(), new_name.to_owned());
        self.emit(ClientEvent::DirectoryChanged);
        if in_open_timeline {
            self.emit(ClientEvent::TimelineChanged);
        }
        Ok(())
    }

    /// Publish text into the open group. The row shows immediately;
    /// the next refresh replaces it with the store's committed copy.
    pub async fn send_message(&mut self, content: &str) -> AppResult<TimelineMessage> {
        let session = self.require_session()?.clone();
        let Some(channel) = self.navigator.current_channel().cloned() else {
            return Err(AppError::InvalidInput("no group is open"));
        };
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::InvalidInput("message cannot be empty"));
        }

        let message = Message::text(content, now_ms());
        self.publish_message(message, channel, &session).await
    }

    /// Publish a recorded voice note into the open group.
    pub async fn send_voice_message(&mut self, audio_data_url: &str) -> AppResult<TimelineMessage> {
        let session = self.require_session()?.clone();
        let Some(channel) = self.navigator.current_channel().cloned() else {
            return Err(AppError::InvalidInput("no group is open"));
        };
        if audio::parse_data_url(audio_data_url).is_none() {
            return Err(AppError::InvalidInput("voice note must be a base64 audio data-url"));
        }

        let message = Message::voice(audio_data_url, now_ms());
        self.publish_message(message, channel, &session).await
    }

    async fn publish_message(
        &mut self,
        message: Message,
        channel: ChannelId,
        session: &Session,
    ) -> AppResult<TimelineMessage> {
        let new = NewObject::new(encode(&message)?, vec![channel]);
        let stored = self
            .store
            .put(new, session)
            .await
            .map_err(AppError::OperationFailed)?;

        let row = TimelineMessage { object: stored.clone(), body: message };
        self.timeline.apply_put(stored);
        self.emit(ClientEvent::TimelineChanged);
        Ok(row)
    }

    /// Replace a message's text. The store only lets the author do
    /// this.
    pub async fn edit_message(&mut self, message: &StoredObject, new_content: &str) -> AppResult<()> {
        let session = self.require_session()?.clone();
        let new_content = new_content.trim();
        if new_content.is_empty() {
            return Err(AppError::InvalidInput("message cannot be empty"));
        }

        let patch = ValuePatch::replace("/content", json!(new_content));
        self.store
            .patch(&patch, message, &session)
            .await
            .map_err(AppError::OperationFailed)?;

        let mut value = message.value.clone();
        if let Some(map) = value.as_object_mut() {
            map.insert("content".to_owned(), json!(new_content));
        }
        self.timeline.apply_patch(&message.url, value);
        self.emit(ClientEvent::TimelineChanged);
        Ok(())
    }

    /// Delete a message. The cached row goes only once the store has
    /// confirmed.
    pub async fn delete_message(&mut self, message: &StoredObject) -> AppResult<()> {
        let session = self.require_session()?.clone();
        self.store
            .delete(message, &session)
            .await
            .map_err(AppError::OperationFailed)?;

        self.timeline.apply_remove(&message.url);
        self.emit(ClientEvent::TimelineChanged);
        Ok(())
    }

    /// Flip this actor's like on a message. The whole array is
    /// rewritten from the copy in hand, so two toggles racing can drop
    /// each other's edit; the next refresh shows whichever write the
    /// store kept.
    pub async fn toggle_like(&mut self, message: &StoredObject) -> AppResult<()> {
        let session = self.require_session()?.clone();
        let current = likes_of(&message.value);
        let updated = toggled(&current, &session.actor);

        let op = if message.value.get("likes").is_some() {
            PatchOp::Replace { path: "/likes".to_owned(), value: json!(updated) }
        } else {
            PatchOp::Add { path: "/likes".to_owned(), value: json!(updated) }
        };
        self.store
            .patch(&ValuePatch::single(op), message, &session)
            .await
            .map_err(AppError::OperationFailed)?;

        let mut value = message.value.clone();
        if let Some(map) = value.as_object_mut() {
            map.insert("likes".to_owned(), json!(updated));
        }
        self.timeline.apply_patch(&message.url, value);
        self.emit(ClientEvent::TimelineChanged);
        Ok(())
    }

    /// One-shot search for messages an actor has liked, across every
    /// group this client knows of. Not cached; each call asks the
    /// store.
    pub async fn liked_messages(&self, actor: &str) -> AppResult<Vec<TimelineMessage>> {
        let channels: Vec<ChannelId> = self
            .directory
            .objects()
            .filter_map(Group::from_object)
            .map(|group| group.record.object.channel)
            .collect();
        let schema = View::LikeSearch(actor.to_owned()).schema();
        let objects = self
            .store
            .discover(&channels, &schema)
            .await
            .map_err(AppError::RefreshFailed)?;

        Ok(crate::cache::reconcile(objects)
            .iter()
            .filter_map(|entry| TimelineMessage::from_object(&entry.object))
            .collect())
    }

    /// Publish a fresh profile into the actor's own channel.
    pub async fn save_profile(&mut self, name: &str, pronouns: &str) -> AppResult<Profile> {
        let session = self.require_session()?.clone();
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("profile name cannot be empty"));
        }
        let pronouns = pronouns.trim();
        let pronouns = (!pronouns.is_empty()).then(|| pronouns.to_owned());

        let profile = Profile::new(name, pronouns, now_ms());
        let new = NewObject::new(encode(&profile)?, vec![session.actor.clone()]);
        self.store
            .put(new, &session)
            .await
            .map_err(AppError::OperationFailed)?;

        self.profile = Some(profile.clone());
        self.emit(ClientEvent::ProfileChanged);
        Ok(profile)
    }

    /// Read an actor's current profile straight from the store.
    pub async fn fetch_profile(&self, actor: &str) -> AppResult<Option<Profile>> {
        let channels = vec![actor.to_owned()];
        let schema = View::Profile.schema();
        let objects = self
            .store
            .discover(&channels, &schema)
            .await
            .map_err(AppError::RefreshFailed)?;
        Ok(latest_profile(objects.iter()))
    }

    /// Refresh the signed-in actor's own profile. Quietly a no-op when
    /// nobody is signed in, matching logout clearing it.
    pub async fn load_profile(&mut self) -> AppResult<Option<Profile>> {
        let Some(session) = self.session.clone() else {
            return Ok(None);
        };
        let profile = self.fetch_profile(&session.actor).await?;
        self.profile = profile.clone();
        self.emit(ClientEvent::ProfileChanged);
        Ok(profile)
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Transcribe a voice note, at most once per object; repeat calls
    /// answer from the transcript cache.
    pub async fn transcribe_message(&mut self, message: &StoredObject) -> AppResult<String> {
        if let Some(text) = self.transcripts.get(&message.url) {
            return Ok(text.clone());
        }
        let Some(audio_data_url) = message.value.get("audio").and_then(Value::as_str) else {
            return Err(AppError::InvalidInput("message has no voice note"));
        };
        let Some(transcriber) = &self.transcriber else {
            return Err(AppError::operation(anyhow!(
                "no transcription endpoint configured"
            )));
        };

        let text = transcriber
            .transcribe(audio_data_url)
            .await
            .map_err(AppError::operation)?;
        self.transcripts.insert(message.url.clone(), text.clone());
        Ok(text)
    }

    pub fn transcript(&self, url: &str) -> Option<&str> {
        self.transcripts.get(url).map(String::as_str)
    }
}

fn idle_timeline() -> CacheKey {
    CacheKey::new(Vec::new(), View::Timeline)
}

fn encode<T: Serialize>(record: &T) -> AppResult<Value> {
    serde_json::to_value(record).map_err(AppError::operation)
}

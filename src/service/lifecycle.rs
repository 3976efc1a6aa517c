//! Lifecycle handler: reacts to voice-state changes.
//!
//! Each event is classified into zero or more [`Transition`]s, which are then
//! applied in order:
//!
//! ```text
//! join trigger        -> Create      (NONE -> CREATING -> ACTIVE)
//! join managed pair   -> SyncJoined  (ACTIVE)
//! leave, pair empty   -> Retire      (ACTIVE -> ARCHIVING | DELETING -> GONE)
//! leave, pair in use  -> SyncLeft    (ACTIVE)
//! ```
//!
//! A member switching channels triggers both an `after` and a `before`
//! transition. Work for one guild is serialized through [`GuildLocks`].

use std::sync::Arc;

use chrono::Utc;

use super::checker::EventCheck;
use super::factory::{ChannelFactory, ChannelPair};
use crate::domain::names::random_names;
use crate::domain::permissions::membership_overwrites;
use crate::domain::{
    ChannelId, ChannelKind, EventBus, GuildId, GuildLocks, LifecycleEvent, MemberRef,
    OverwriteTarget, Overwrites, PermissionOverwrite, TextDisposition, VoiceStateUpdate,
};
use crate::error::BotError;
use crate::persistence::{CreatedChannel, Store};
use crate::platform::{ChannelInfo, ChatPlatform, Notice, PlatformError};

const DELETED: &str = "`deleted`";

/// One lifecycle step derived from a voice-state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The member joined a trigger channel.
    Create {
        /// Kind of pair to create.
        kind: ChannelKind,
        /// Trigger channel joined.
        trigger: ChannelId,
    },
    /// The member joined a managed voice channel.
    SyncJoined(CreatedChannel),
    /// The last member left a managed voice channel.
    Retire(CreatedChannel),
    /// A member left a managed voice channel that is still in use.
    SyncLeft(CreatedChannel),
}

/// Lifecycle Handler.
#[derive(Debug, Clone)]
pub struct LifecycleService {
    store: Arc<dyn Store>,
    platform: Arc<dyn ChatPlatform>,
    factory: ChannelFactory,
    event_bus: EventBus,
    locks: Arc<GuildLocks>,
}

impl LifecycleService {
    /// Creates a new `LifecycleService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        platform: Arc<dyn ChatPlatform>,
        event_bus: EventBus,
        locks: Arc<GuildLocks>,
        version: String,
    ) -> Self {
        let factory = ChannelFactory::new(Arc::clone(&platform), Arc::clone(&store), version);
        Self {
            store,
            platform,
            factory,
            event_bus,
            locks,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Handles one voice-state change and returns the transitions applied.
    ///
    /// Never fails: every error is logged and the remaining transitions
    /// still run.
    pub async fn handle_voice_update(&self, event: &VoiceStateUpdate) -> Vec<Transition> {
        let _guard = self.locks.acquire(event.guild_id).await;

        let transitions = match self.classify(event).await {
            Ok(transitions) => transitions,
            Err(e) => {
                tracing::error!(guild_id = %event.guild_id, error = %e, "failed to classify voice update");
                return Vec::new();
            }
        };

        for transition in &transitions {
            if let Err(e) = self.apply(event, transition).await {
                tracing::error!(
                    guild_id = %event.guild_id,
                    member_id = %event.member.id,
                    ?transition,
                    error = %e,
                    "lifecycle transition failed"
                );
            }
        }
        transitions
    }

    /// Decides which transitions `event` triggers, without side effects.
    ///
    /// A failed member lookup for the channel left only drops the `before`
    /// side; transitions already derived from `after` are kept.
    ///
    /// # Errors
    ///
    /// Propagates store lookup failures.
    pub async fn classify(&self, event: &VoiceStateUpdate) -> Result<Vec<Transition>, BotError> {
        let mut transitions = Vec::new();
        if event.is_same_channel() {
            return Ok(transitions);
        }
        let check = EventCheck::new(self.store.as_ref(), event.guild_id);

        if let Some(after) = event.after {
            if let Some(kind) = check.is_activate(after).await? {
                transitions.push(Transition::Create {
                    kind,
                    trigger: after,
                });
            } else if let Some(record) = check.is_created_channel(after).await?.into_iter().next()
            {
                transitions.push(Transition::SyncJoined(record));
            }
        }

        if let Some(before) = event.before
            && let Some(record) = check.is_created_channel(before).await?.into_iter().next()
        {
            match self.platform.voice_members(event.guild_id, before).await {
                Ok(members) if members.is_empty() => transitions.push(Transition::Retire(record)),
                Ok(_) => transitions.push(Transition::SyncLeft(record)),
                Err(e) => tracing::warn!(
                    guild_id = %event.guild_id,
                    voice_channel_id = %before,
                    error = %e,
                    "could not read voice members of the channel left, skipping it"
                ),
            }
        }

        Ok(transitions)
    }

    async fn apply(&self, event: &VoiceStateUpdate, transition: &Transition) -> Result<(), BotError> {
        let check = EventCheck::new(self.store.as_ref(), event.guild_id);
        match transition {
            Transition::Create { kind, trigger } => {
                self.open_pair(&check, &event.member, *kind, *trigger).await
            }
            Transition::SyncJoined(record) | Transition::SyncLeft(record) => {
                self.sync_membership(record).await
            }
            Transition::Retire(record) => self.retire_pair(&check, &event.member, record).await,
        }
    }

    async fn open_pair(
        &self,
        check: &EventCheck<'_>,
        member: &MemberRef,
        kind: ChannelKind,
        trigger_id: ChannelId,
    ) -> Result<(), BotError> {
        let guild_id = check.guild_id();
        let Some(trigger) = self.platform.channel(guild_id, trigger_id).await? else {
            tracing::warn!(%guild_id, %trigger_id, "trigger channel vanished before creation");
            return Ok(());
        };

        let names = random_names(kind, &member.display_name);
        let voice_overwrites = self.voice_overwrites(check, member, kind, &trigger).await?;

        let pair = match self
            .factory
            .create_pair(guild_id, &trigger, member, voice_overwrites, names, kind)
            .await
        {
            Ok(pair) => pair,
            Err(failure) => {
                for orphan in &failure.orphans {
                    self.delete_quietly(guild_id, orphan.id).await;
                }
                return Err(failure.source);
            }
        };

        tracing::info!(
            %guild_id,
            member_id = %member.id,
            voice_channel_id = %pair.voice.id,
            text_channel_id = %pair.text.id,
            %kind,
            "channel pair created"
        );
        let _ = self.event_bus.publish(LifecycleEvent::PairCreated {
            guild_id,
            kind,
            voice_channel_id: pair.voice.id,
            text_channel_id: pair.text.id,
            owner_id: member.id,
            timestamp: Utc::now(),
        });

        let log = self.log_channel(check).await;
        self.notify(
            guild_id,
            log,
            Notice::success(
                "Created voice channel",
                format!(
                    "{} created `{}` with {}",
                    member.mention(),
                    pair.voice.name,
                    pair.text.id.mention()
                ),
            ),
        )
        .await;

        if let Err(e) = self
            .platform
            .move_member(guild_id, member.id, pair.voice.id)
            .await
        {
            tracing::warn!(
                %guild_id,
                member_id = %member.id,
                error = %e,
                "could not move creator, member most likely left during creation"
            );
            self.abort_creation(check, member, &pair, log).await?;
        }
        Ok(())
    }

    /// Voice overwrites for a new pair.
    ///
    /// Private pairs lock out the default role and hand the creator channel
    /// management. Public pairs stay synced with the category unless rename
    /// rights are enabled, in which case the category overwrites are copied
    /// and the creator added on top.
    async fn voice_overwrites(
        &self,
        check: &EventCheck<'_>,
        member: &MemberRef,
        kind: ChannelKind,
        trigger: &ChannelInfo,
    ) -> Result<Overwrites, BotError> {
        let guild_id = check.guild_id();
        let mut overwrites = Overwrites::new();
        match kind {
            ChannelKind::Private => {
                overwrites.insert(
                    OverwriteTarget::Role(guild_id.everyone_role()),
                    PermissionOverwrite::new().connect(false),
                );
                overwrites.insert(
                    OverwriteTarget::Member(member.id),
                    PermissionOverwrite::new()
                        .manage_channels(true)
                        .manage_permissions(true)
                        .connect(true),
                );
            }
            ChannelKind::Public if check.get_edit_perms().await? => {
                if let Some(category_id) = trigger.parent_id
                    && let Some(category) = self.platform.channel(guild_id, category_id).await?
                {
                    overwrites = category.overwrites;
                }
                overwrites.insert(
                    OverwriteTarget::Member(member.id),
                    PermissionOverwrite::new()
                        .manage_channels(true)
                        .connect(true),
                );
            }
            ChannelKind::Public => {}
        }
        Ok(overwrites)
    }

    /// Cleanup after the creator could not be moved in: the voice channel
    /// goes, the text channel is archived or deleted, the registry row goes.
    async fn abort_creation(
        &self,
        check: &EventCheck<'_>,
        member: &MemberRef,
        pair: &ChannelPair,
        log: Option<ChannelId>,
    ) -> Result<(), BotError> {
        let guild_id = check.guild_id();
        self.delete_quietly(guild_id, pair.voice.id).await;

        if let Err(e) = self.archive_or_delete(check, pair.text.id).await {
            tracing::error!(%guild_id, text_channel_id = %pair.text.id, error = %e, "could not remove text channel of aborted pair");
        }
        check.del_entry(pair.voice.id).await?;

        let _ = self.event_bus.publish(LifecycleEvent::CreationAborted {
            guild_id,
            voice_channel_id: pair.voice.id,
            text_channel_id: pair.text.id,
            owner_id: member.id,
            timestamp: Utc::now(),
        });
        self.notify(
            guild_id,
            log,
            Notice::warning(
                "Creation aborted",
                format!(
                    "{} left before `{}` was ready, the channels were removed",
                    member.mention(),
                    pair.voice.name
                ),
            ),
        )
        .await;
        Ok(())
    }

    /// Tears down an emptied pair. If the text channel cannot be archived or
    /// deleted, nothing is removed and the pair stays live.
    async fn retire_pair(
        &self,
        check: &EventCheck<'_>,
        member: &MemberRef,
        record: &CreatedChannel,
    ) -> Result<(), BotError> {
        let guild_id = check.guild_id();
        let log = self.log_channel(check).await;
        let voice = self
            .platform
            .channel(guild_id, record.voice_channel_id)
            .await?;
        let text = self
            .platform
            .channel(guild_id, record.text_channel_id)
            .await?;

        let disposition = match self.archive_or_delete(check, record.text_channel_id).await {
            Ok(disposition) => disposition,
            Err(e) => {
                tracing::error!(
                    %guild_id,
                    voice_channel_id = %record.voice_channel_id,
                    error = %e,
                    "teardown aborted, pair left live"
                );
                let body = match &e {
                    BotError::ArchiveFull(_) => "This error probably means that the archive category is full, \
                         please check it and set a new one or delete older channels - Nothing was deleted"
                        .to_string(),
                    other => format!("Could not remove the text channel ({other}) - Nothing was deleted"),
                };
                let _ = self.event_bus.publish(LifecycleEvent::TeardownAborted {
                    guild_id,
                    voice_channel_id: record.voice_channel_id,
                    text_channel_id: record.text_channel_id,
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
                self.notify(guild_id, log, Notice::error("ERROR", body)).await;
                return Err(e);
            }
        };

        check.del_entry(record.voice_channel_id).await?;
        if voice.is_some() {
            self.delete_quietly(guild_id, record.voice_channel_id).await;
        }

        tracing::info!(
            %guild_id,
            voice_channel_id = %record.voice_channel_id,
            ?disposition,
            "channel pair retired"
        );
        let _ = self.event_bus.publish(LifecycleEvent::PairRetired {
            guild_id,
            voice_channel_id: record.voice_channel_id,
            text_channel_id: record.text_channel_id,
            disposition,
            timestamp: Utc::now(),
        });

        let voice_name = voice.map_or_else(|| DELETED.to_string(), |v| format!("`{}`", v.name));
        let text_name = match (text, disposition) {
            (Some(t), TextDisposition::Archived) => t.id.mention(),
            (Some(t), _) => format!("`{}`", t.name),
            (None, _) => DELETED.to_string(),
        };
        let action = match disposition {
            TextDisposition::Archived => "archived",
            TextDisposition::Deleted | TextDisposition::Missing => "deleted",
        };
        self.notify(
            guild_id,
            log,
            Notice::success(
                "Removed voice channel",
                format!(
                    "{} left {voice_name} as the last member, {text_name} was {action}",
                    member.mention()
                ),
            ),
        )
        .await;
        Ok(())
    }

    /// Archive-or-delete policy for a linked text channel: archive when an
    /// archive category exists and the channel has history, delete otherwise.
    async fn archive_or_delete(
        &self,
        check: &EventCheck<'_>,
        text_id: ChannelId,
    ) -> Result<TextDisposition, BotError> {
        let guild_id = check.guild_id();
        let Some(text) = self.platform.channel(guild_id, text_id).await? else {
            return Ok(TextDisposition::Missing);
        };

        if text.has_messages
            && let Some(archive) = self.resolve(guild_id, check.get_archive().await?).await?
        {
            return match self.platform.set_parent(guild_id, text.id, archive).await {
                Ok(()) => Ok(TextDisposition::Archived),
                Err(PlatformError::NotFound) => Ok(TextDisposition::Missing),
                Err(e) => Err(BotError::ArchiveFull(e.to_string())),
            };
        }

        match self.platform.delete_channel(guild_id, text.id).await {
            Ok(()) => Ok(TextDisposition::Deleted),
            Err(PlatformError::NotFound) => Ok(TextDisposition::Missing),
            Err(e) => Err(e.into()),
        }
    }

    /// Recomputes text-channel visibility from the current voice members.
    async fn sync_membership(&self, record: &CreatedChannel) -> Result<(), BotError> {
        let guild_id = record.guild_id;
        if self
            .platform
            .channel(guild_id, record.voice_channel_id)
            .await?
            .is_none()
        {
            tracing::debug!(%guild_id, voice_channel_id = %record.voice_channel_id, "voice channel gone, skipping sync");
            return Ok(());
        }
        if self
            .platform
            .channel(guild_id, record.text_channel_id)
            .await?
            .is_none()
        {
            tracing::debug!(%guild_id, text_channel_id = %record.text_channel_id, "text channel gone, skipping sync");
            return Ok(());
        }

        let members = self
            .platform
            .voice_members(guild_id, record.voice_channel_id)
            .await?;
        let overwrites = membership_overwrites(guild_id.everyone_role(), &members);
        match self
            .platform
            .edit_overwrites(guild_id, record.text_channel_id, &overwrites)
            .await
        {
            Ok(()) | Err(PlatformError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let _ = self.event_bus.publish(LifecycleEvent::MembershipSynced {
            guild_id,
            voice_channel_id: record.voice_channel_id,
            text_channel_id: record.text_channel_id,
            member_count: members.len(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Configured log channel, if it still exists. Lookup failures only
    /// cost the notice.
    async fn log_channel(&self, check: &EventCheck<'_>) -> Option<ChannelId> {
        match check.get_log().await {
            Ok(id) => self.resolve(check.guild_id(), id).await.ok().flatten(),
            Err(e) => {
                tracing::warn!(guild_id = %check.guild_id(), error = %e, "could not read log channel setting");
                None
            }
        }
    }

    async fn resolve(
        &self,
        guild_id: GuildId,
        id: Option<ChannelId>,
    ) -> Result<Option<ChannelId>, BotError> {
        let Some(id) = id else {
            return Ok(None);
        };
        Ok(self.platform.channel(guild_id, id).await?.map(|c| c.id))
    }

    async fn notify(&self, guild_id: GuildId, log: Option<ChannelId>, notice: Notice) {
        let Some(log) = log else {
            return;
        };
        if let Err(e) = self.platform.send_notice(guild_id, log, &notice).await {
            tracing::warn!(%guild_id, log_channel_id = %log, error = %e, "failed to send log notice");
        }
    }

    async fn delete_quietly(&self, guild_id: GuildId, channel_id: ChannelId) {
        match self.platform.delete_channel(guild_id, channel_id).await {
            Ok(()) | Err(PlatformError::NotFound) => {}
            Err(e) => {
                tracing::warn!(%guild_id, %channel_id, error = %e, "failed to delete channel");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{SettingName, UserId};
    use crate::persistence::{MemoryStore, Setting};
    use crate::platform::fake::FakePlatform;
    use crate::platform::{ChannelType, NoticeLevel};

    const GUILD: GuildId = GuildId::new(100);
    const CATEGORY: u64 = 1;
    const PUB_TRIGGER: u64 = 2;
    const PRIV_TRIGGER: u64 = 3;
    const LOG: u64 = 4;
    const ARCHIVE: u64 = 5;
    const LOBBY: u64 = 6;

    struct Harness {
        platform: Arc<FakePlatform>,
        store: Arc<MemoryStore>,
        service: LifecycleService,
    }

    impl Harness {
        async fn new() -> Self {
            let platform = Arc::new(FakePlatform::new());
            let store = Arc::new(MemoryStore::new());
            platform
                .add_channel(CATEGORY, "Voice Channels", ChannelType::Category, None)
                .await;
            platform
                .add_channel(PUB_TRIGGER, "╔create-voice-channel", ChannelType::Voice, Some(CATEGORY))
                .await;
            platform
                .add_channel(PRIV_TRIGGER, "╠new-private-channel", ChannelType::Voice, Some(CATEGORY))
                .await;
            platform.add_channel(LOBBY, "lobby", ChannelType::Voice, None).await;
            let service = LifecycleService::new(
                Arc::clone(&store) as Arc<dyn Store>,
                Arc::clone(&platform) as Arc<dyn ChatPlatform>,
                EventBus::new(64),
                Arc::new(GuildLocks::new()),
                "v-test".to_string(),
            );
            let harness = Self {
                platform,
                store,
                service,
            };
            harness.setting(SettingName::Pub, PUB_TRIGGER).await;
            harness.setting(SettingName::Priv, PRIV_TRIGGER).await;
            harness
        }

        async fn setting(&self, name: SettingName, value: u64) {
            let row = Setting::new(GUILD, name, "value_name", value, "v-test");
            assert!(self.store.insert_setting(&row).await.is_ok());
        }

        async fn with_log(&self) {
            self.platform.add_channel(LOG, "log", ChannelType::Text, None).await;
            self.setting(SettingName::Log, LOG).await;
        }

        async fn with_archive(&self) {
            self.platform
                .add_channel(ARCHIVE, "Archive", ChannelType::Category, None)
                .await;
            self.setting(SettingName::Archive, ARCHIVE).await;
        }

        async fn records(&self) -> Vec<CreatedChannel> {
            self.store
                .list_created_channels(GUILD)
                .await
                .unwrap_or_default()
        }

        /// Member joins a trigger (from nowhere) and is moved into a new pair.
        async fn create(&self, user: u64, trigger: u64) -> CreatedChannel {
            let member = member(user);
            self.platform
                .set_voice_members(ChannelId::new(trigger), &[member.id])
                .await;
            let transitions = self
                .service
                .handle_voice_update(&update(&member, None, Some(trigger)))
                .await;
            assert!(matches!(transitions.as_slice(), [Transition::Create { .. }]));
            let Some(record) = self.records().await.pop() else {
                panic!("pair not registered");
            };
            record
        }
    }

    fn member(id: u64) -> MemberRef {
        MemberRef::new(UserId::new(id), format!("user{id}"))
    }

    fn update(member: &MemberRef, before: Option<u64>, after: Option<u64>) -> VoiceStateUpdate {
        VoiceStateUpdate {
            guild_id: GUILD,
            member: member.clone(),
            before: before.map(ChannelId::new),
            after: after.map(ChannelId::new),
        }
    }

    #[tokio::test]
    async fn private_trigger_creates_locked_pair_and_moves_creator() {
        let h = Harness::new().await;
        let creator = member(42);

        let record = h.create(42, PRIV_TRIGGER).await;
        assert_eq!(record.kind, ChannelKind::Private);

        let Some(voice) = h.platform.get(record.voice_channel_id).await else {
            panic!("voice channel missing");
        };
        assert_eq!(voice.parent_id, Some(ChannelId::new(CATEGORY)));
        assert_eq!(
            voice.overwrites.get(&OverwriteTarget::Member(creator.id)),
            Some(
                &PermissionOverwrite::new()
                    .manage_channels(true)
                    .manage_permissions(true)
                    .connect(true)
            )
        );
        assert_eq!(
            voice
                .overwrites
                .get(&OverwriteTarget::Role(GUILD.everyone_role())),
            Some(&PermissionOverwrite::new().connect(false))
        );

        let Some(text) = h.platform.get(record.text_channel_id).await else {
            panic!("text channel missing");
        };
        assert_eq!(text.overwrites.members_with_view(), vec![creator.id]);

        let state = h.platform.state.lock().await;
        assert_eq!(state.moves, vec![(creator.id, record.voice_channel_id)]);
    }

    #[tokio::test]
    async fn public_pair_stays_synced_without_edit_perms() {
        let h = Harness::new().await;
        let record = h.create(7, PUB_TRIGGER).await;

        let Some(voice) = h.platform.get(record.voice_channel_id).await else {
            panic!("voice channel missing");
        };
        assert_eq!(record.kind, ChannelKind::Public);
        assert!(voice.overwrites.is_empty());
    }

    #[tokio::test]
    async fn public_pair_copies_category_overwrites_with_edit_perms() {
        let h = Harness::new().await;
        h.setting(SettingName::EditChannel, 1).await;
        let role = crate::domain::RoleId::new(555);
        let category_rule = PermissionOverwrite::new()
            .view_channel(true)
            .connect(true)
            .other(1 << 8, (1 << 9) | (1 << 11));
        let category_overwrites: Overwrites = [(OverwriteTarget::Role(role), category_rule)]
        .into_iter()
        .collect();
        assert!(
            h.platform
                .edit_overwrites(GUILD, ChannelId::new(CATEGORY), &category_overwrites)
                .await
                .is_ok()
        );

        let record = h.create(7, PUB_TRIGGER).await;
        let Some(voice) = h.platform.get(record.voice_channel_id).await else {
            panic!("voice channel missing");
        };
        assert_eq!(
            voice.overwrites.get(&OverwriteTarget::Role(role)),
            Some(&category_rule)
        );
        assert_eq!(
            voice.overwrites.get(&OverwriteTarget::Member(UserId::new(7))),
            Some(&PermissionOverwrite::new().manage_channels(true).connect(true))
        );
    }

    #[tokio::test]
    async fn creation_is_logged_and_published() {
        let h = Harness::new().await;
        h.with_log().await;
        let mut rx = h.service.event_bus().subscribe();

        let record = h.create(8, PUB_TRIGGER).await;

        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "pair_created");
        assert_eq!(event.voice_channel_id(), record.voice_channel_id);

        let state = h.platform.state.lock().await;
        let Some((channel, notice)) = state.notices.first() else {
            panic!("expected creation notice");
        };
        assert_eq!(*channel, ChannelId::new(LOG));
        assert_eq!(notice.level, NoticeLevel::Success);
        assert!(notice.body.contains("<@8>"));
        assert!(notice.body.contains(&record.text_channel_id.mention()));
    }

    #[tokio::test]
    async fn failed_move_removes_pair_and_registry_row() {
        let h = Harness::new().await;
        h.with_log().await;
        h.platform.state.lock().await.fail_moves = true;
        let creator = member(9);

        let transitions = h
            .service
            .handle_voice_update(&update(&creator, None, Some(PUB_TRIGGER)))
            .await;
        assert_eq!(transitions.len(), 1);
        assert!(h.records().await.is_empty());

        let state = h.platform.state.lock().await;
        assert_eq!(state.deleted.len(), 2);
        let Some(voice) = state.deleted.first() else {
            panic!("voice channel not deleted");
        };
        assert!(!state.channels.contains_key(voice));
        assert!(
            state
                .notices
                .iter()
                .any(|(_, n)| n.title == "Creation aborted")
        );
    }

    #[tokio::test]
    async fn joining_and_leaving_a_pair_syncs_text_visibility() {
        let h = Harness::new().await;
        let record = h.create(1, PUB_TRIGGER).await;
        let voice = record.voice_channel_id;
        let (a, b) = (member(1), member(2));

        h.platform.set_voice_members(voice, &[a.id, b.id]).await;
        let transitions = h
            .service
            .handle_voice_update(&update(&b, Some(LOBBY), Some(voice.get())))
            .await;
        assert_eq!(transitions, vec![Transition::SyncJoined(record.clone())]);
        let Some(text) = h.platform.get(record.text_channel_id).await else {
            panic!("text channel missing");
        };
        assert_eq!(text.overwrites.members_with_view(), vec![a.id, b.id]);
        assert_eq!(
            text.overwrites
                .get(&OverwriteTarget::Role(GUILD.everyone_role())),
            Some(&PermissionOverwrite::new().view_channel(false))
        );

        h.platform.set_voice_members(voice, &[a.id]).await;
        let transitions = h
            .service
            .handle_voice_update(&update(&b, Some(voice.get()), None))
            .await;
        assert_eq!(transitions, vec![Transition::SyncLeft(record.clone())]);
        let Some(text) = h.platform.get(record.text_channel_id).await else {
            panic!("text channel missing");
        };
        assert_eq!(text.overwrites.members_with_view(), vec![a.id]);
    }

    #[tokio::test]
    async fn sync_skips_when_voice_channel_was_deleted() {
        let h = Harness::new().await;
        let record = h.create(1, PUB_TRIGGER).await;
        h.platform.remove_out_of_band(record.voice_channel_id).await;
        let Some(before) = h.platform.get(record.text_channel_id).await else {
            panic!("text channel missing");
        };

        h.service
            .handle_voice_update(&update(&member(2), None, Some(record.voice_channel_id.get())))
            .await;

        assert_eq!(h.platform.get(record.text_channel_id).await, Some(before));
    }

    #[tokio::test]
    async fn last_leave_deletes_pair_with_messages_when_no_archive() {
        let h = Harness::new().await;
        let record = h.create(1, PUB_TRIGGER).await;
        h.platform.mark_messages(record.text_channel_id).await;
        h.platform.set_voice_members(record.voice_channel_id, &[]).await;

        let transitions = h
            .service
            .handle_voice_update(&update(&member(1), Some(record.voice_channel_id.get()), None))
            .await;

        assert_eq!(transitions, vec![Transition::Retire(record.clone())]);
        assert!(h.platform.get(record.text_channel_id).await.is_none());
        assert!(h.platform.get(record.voice_channel_id).await.is_none());
        assert!(h.records().await.is_empty());
    }

    #[tokio::test]
    async fn last_leave_archives_text_channel_with_history() {
        let h = Harness::new().await;
        h.with_archive().await;
        let record = h.create(1, PUB_TRIGGER).await;
        h.platform.mark_messages(record.text_channel_id).await;
        h.platform.set_voice_members(record.voice_channel_id, &[]).await;
        let mut rx = h.service.event_bus().subscribe();

        h.service
            .handle_voice_update(&update(&member(1), Some(record.voice_channel_id.get()), None))
            .await;

        let Some(text) = h.platform.get(record.text_channel_id).await else {
            panic!("archived text channel should remain");
        };
        assert_eq!(text.parent_id, Some(ChannelId::new(ARCHIVE)));
        assert!(h.platform.get(record.voice_channel_id).await.is_none());
        assert!(h.records().await.is_empty());

        let Ok(LifecycleEvent::PairRetired { disposition, .. }) = rx.recv().await else {
            panic!("expected retirement event");
        };
        assert_eq!(disposition, TextDisposition::Archived);
    }

    #[tokio::test]
    async fn archive_is_skipped_for_silent_text_channels() {
        let h = Harness::new().await;
        h.with_archive().await;
        let record = h.create(1, PUB_TRIGGER).await;
        h.platform.set_voice_members(record.voice_channel_id, &[]).await;

        h.service
            .handle_voice_update(&update(&member(1), Some(record.voice_channel_id.get()), None))
            .await;

        assert!(h.platform.get(record.text_channel_id).await.is_none());
        assert!(h.records().await.is_empty());
    }

    #[tokio::test]
    async fn full_archive_aborts_teardown_and_reports() {
        let h = Harness::new().await;
        h.with_log().await;
        h.with_archive().await;
        let record = h.create(1, PUB_TRIGGER).await;
        h.platform.mark_messages(record.text_channel_id).await;
        h.platform.set_voice_members(record.voice_channel_id, &[]).await;
        h.platform.state.lock().await.fail_reparent = true;

        h.service
            .handle_voice_update(&update(&member(1), Some(record.voice_channel_id.get()), None))
            .await;

        assert!(h.platform.get(record.voice_channel_id).await.is_some());
        assert!(h.platform.get(record.text_channel_id).await.is_some());
        assert_eq!(h.records().await, vec![record]);

        let state = h.platform.state.lock().await;
        let Some((_, notice)) = state.notices.last() else {
            panic!("expected error notice");
        };
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.body.contains("archive category is full"));
    }

    #[tokio::test]
    async fn delete_failure_aborts_teardown_and_reports() {
        let h = Harness::new().await;
        h.with_log().await;
        let record = h.create(1, PUB_TRIGGER).await;
        h.platform.set_voice_members(record.voice_channel_id, &[]).await;
        h.platform.state.lock().await.fail_deletes = true;
        let mut rx = h.service.event_bus().subscribe();

        let transitions = h
            .service
            .handle_voice_update(&update(&member(1), Some(record.voice_channel_id.get()), None))
            .await;

        assert_eq!(transitions, vec![Transition::Retire(record.clone())]);
        assert!(h.platform.get(record.voice_channel_id).await.is_some());
        assert!(h.platform.get(record.text_channel_id).await.is_some());
        assert_eq!(h.records().await, vec![record.clone()]);

        let Ok(LifecycleEvent::TeardownAborted {
            voice_channel_id, ..
        }) = rx.recv().await
        else {
            panic!("expected teardown abort event");
        };
        assert_eq!(voice_channel_id, record.voice_channel_id);

        let state = h.platform.state.lock().await;
        assert!(state.deleted.is_empty());
        let Some((channel, notice)) = state.notices.last() else {
            panic!("expected error notice");
        };
        assert_eq!(*channel, ChannelId::new(LOG));
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.body.contains("Nothing was deleted"));
    }

    #[tokio::test]
    async fn failed_member_lookup_keeps_creation_when_switching() {
        let h = Harness::new().await;
        let first = h.create(1, PUB_TRIGGER).await;
        h.platform.state.lock().await.fail_voice_members = true;

        let transitions = h
            .service
            .handle_voice_update(&update(
                &member(1),
                Some(first.voice_channel_id.get()),
                Some(PRIV_TRIGGER),
            ))
            .await;

        assert!(matches!(
            transitions.as_slice(),
            [Transition::Create {
                kind: ChannelKind::Private,
                ..
            }]
        ));
        let records = h.records().await;
        assert_eq!(records.len(), 2);
        assert!(records.contains(&first));
    }

    #[tokio::test]
    async fn teardown_tolerates_channels_deleted_out_of_band() {
        let h = Harness::new().await;
        h.with_log().await;
        let record = h.create(1, PUB_TRIGGER).await;
        h.platform.remove_out_of_band(record.voice_channel_id).await;
        h.platform.remove_out_of_band(record.text_channel_id).await;

        h.service
            .handle_voice_update(&update(&member(1), Some(record.voice_channel_id.get()), None))
            .await;

        assert!(h.records().await.is_empty());
        let state = h.platform.state.lock().await;
        let Some((_, notice)) = state.notices.last() else {
            panic!("expected removal notice");
        };
        assert_eq!(notice.title, "Removed voice channel");
        assert!(notice.body.contains(DELETED));
    }

    #[tokio::test]
    async fn switching_from_pair_to_trigger_runs_both_sides() {
        let h = Harness::new().await;
        let first = h.create(1, PUB_TRIGGER).await;
        h.platform.set_voice_members(first.voice_channel_id, &[]).await;

        let transitions = h
            .service
            .handle_voice_update(&update(
                &member(1),
                Some(first.voice_channel_id.get()),
                Some(PRIV_TRIGGER),
            ))
            .await;

        assert_eq!(transitions.len(), 2);
        assert!(matches!(
            transitions.first(),
            Some(Transition::Create {
                kind: ChannelKind::Private,
                ..
            })
        ));
        assert_eq!(transitions.get(1), Some(&Transition::Retire(first.clone())));
        let records = h.records().await;
        assert_eq!(records.len(), 1);
        assert!(records.iter().all(|r| r.voice_channel_id != first.voice_channel_id));
    }

    #[tokio::test]
    async fn unrelated_channels_and_state_toggles_are_ignored() {
        let h = Harness::new().await;
        let m = member(3);
        assert!(
            h.service
                .handle_voice_update(&update(&m, None, Some(LOBBY)))
                .await
                .is_empty()
        );
        assert!(
            h.service
                .handle_voice_update(&update(&m, Some(PUB_TRIGGER), Some(PUB_TRIGGER)))
                .await
                .is_empty()
        );
        assert!(h.records().await.is_empty());
    }

    #[tokio::test]
    async fn trigger_without_category_creates_top_level_pair() {
        let h = Harness::new().await;
        h.platform
            .add_channel(20, "loose trigger", ChannelType::Voice, None)
            .await;
        h.setting(SettingName::PubChannel, 20).await;

        let record = h.create(4, 20).await;
        let Some(voice) = h.platform.get(record.voice_channel_id).await else {
            panic!("voice channel missing");
        };
        assert_eq!(voice.parent_id, None);
    }
}

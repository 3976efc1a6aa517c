//! In-memory [`ChatPlatform`] used by service tests.
//!
//! Records every mutating call and lets a test inject the failures the
//! lifecycle has to survive: a member disconnecting before the move, an
//! archive category that is full, rejected deletions, an uncached guild and
//! channels deleted out of band.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ChannelInfo, ChannelType, ChatPlatform, NewChannel, Notice, PlatformError};
use crate::domain::{ChannelId, GuildId, Overwrites, RoleId, UserId};

/// Mutable state behind [`FakePlatform`].
#[derive(Debug, Default)]
pub struct FakeState {
    /// Live channels.
    pub channels: BTreeMap<ChannelId, ChannelInfo>,
    /// Voice channel → connected members.
    pub voice: HashMap<ChannelId, Vec<UserId>>,
    /// Existing roles.
    pub roles: HashSet<RoleId>,
    /// Members holding administrator.
    pub admins: HashSet<UserId>,
    /// Notices sent, in order.
    pub notices: Vec<(ChannelId, Notice)>,
    /// Channels deleted through the platform, in order.
    pub deleted: Vec<ChannelId>,
    /// Successful member moves.
    pub moves: Vec<(UserId, ChannelId)>,
    /// Fail every member move.
    pub fail_moves: bool,
    /// Fail every re-parent (archive full).
    pub fail_reparent: bool,
    /// Fail creation of text channels.
    pub fail_text_creation: bool,
    /// Fail every channel deletion.
    pub fail_deletes: bool,
    /// Fail every voice member lookup (guild not cached).
    pub fail_voice_members: bool,
    next_id: u64,
}

/// Recording platform double.
#[derive(Debug, Default)]
pub struct FakePlatform {
    /// Inspectable state.
    pub state: Mutex<FakeState>,
}

impl FakePlatform {
    /// Empty platform; created channels get ids from 1000 upwards.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_id: 1000,
                ..FakeState::default()
            }),
        }
    }

    /// Seeds a channel.
    pub async fn add_channel(
        &self,
        id: u64,
        name: &str,
        kind: ChannelType,
        parent: Option<u64>,
    ) -> ChannelId {
        let id = ChannelId::new(id);
        self.state.lock().await.channels.insert(
            id,
            ChannelInfo {
                id,
                name: name.to_string(),
                kind,
                parent_id: parent.map(ChannelId::new),
                overwrites: Overwrites::new(),
                has_messages: false,
            },
        );
        id
    }

    /// Replaces the member list of a voice channel.
    pub async fn set_voice_members(&self, channel: ChannelId, members: &[UserId]) {
        self.state
            .lock()
            .await
            .voice
            .insert(channel, members.to_vec());
    }

    /// Marks a channel as having message history.
    pub async fn mark_messages(&self, channel: ChannelId) {
        if let Some(info) = self.state.lock().await.channels.get_mut(&channel) {
            info.has_messages = true;
        }
    }

    /// Removes a channel without recording it, as if deleted by a moderator.
    pub async fn remove_out_of_band(&self, channel: ChannelId) {
        let mut state = self.state.lock().await;
        state.channels.remove(&channel);
        state.voice.remove(&channel);
    }

    /// Snapshot of a channel.
    pub async fn get(&self, channel: ChannelId) -> Option<ChannelInfo> {
        self.state.lock().await.channels.get(&channel).cloned()
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn channel(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Option<ChannelInfo>, PlatformError> {
        Ok(self.state.lock().await.channels.get(&channel_id).cloned())
    }

    async fn voice_members(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Vec<UserId>, PlatformError> {
        let state = self.state.lock().await;
        if state.fail_voice_members {
            return Err(PlatformError::Unavailable("guild not cached".to_string()));
        }
        Ok(state.voice.get(&channel_id).cloned().unwrap_or_default())
    }

    async fn role_exists(&self, guild_id: GuildId, role_id: RoleId) -> Result<bool, PlatformError> {
        Ok(role_id == guild_id.everyone_role() || self.state.lock().await.roles.contains(&role_id))
    }

    async fn is_administrator(
        &self,
        _guild_id: GuildId,
        user_id: UserId,
    ) -> Result<bool, PlatformError> {
        Ok(self.state.lock().await.admins.contains(&user_id))
    }

    async fn create_channel(
        &self,
        _guild_id: GuildId,
        channel: NewChannel,
    ) -> Result<ChannelInfo, PlatformError> {
        let mut state = self.state.lock().await;
        if state.fail_text_creation && channel.kind == ChannelType::Text {
            return Err(PlatformError::Http {
                status: 500,
                code: 0,
                message: "text channel creation failed".to_string(),
            });
        }
        state.next_id += 1;
        let id = ChannelId::new(state.next_id);
        let info = ChannelInfo {
            id,
            name: channel.name,
            kind: channel.kind,
            parent_id: channel.parent_id,
            overwrites: channel.overwrites,
            has_messages: false,
        };
        state.channels.insert(id, info.clone());
        Ok(info)
    }

    async fn edit_overwrites(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
        overwrites: &Overwrites,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().await;
        let info = state
            .channels
            .get_mut(&channel_id)
            .ok_or(PlatformError::NotFound)?;
        info.overwrites = overwrites.clone();
        Ok(())
    }

    async fn set_parent(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
        parent_id: ChannelId,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().await;
        if state.fail_reparent {
            return Err(PlatformError::Http {
                status: 400,
                code: 50035,
                message: "Maximum number of channels in category reached (50)".to_string(),
            });
        }
        let info = state
            .channels
            .get_mut(&channel_id)
            .ok_or(PlatformError::NotFound)?;
        info.parent_id = Some(parent_id);
        Ok(())
    }

    async fn delete_channel(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().await;
        if state.fail_deletes {
            return Err(PlatformError::Http {
                status: 403,
                code: 50013,
                message: "Missing Permissions".to_string(),
            });
        }
        state
            .channels
            .remove(&channel_id)
            .ok_or(PlatformError::NotFound)?;
        state.voice.remove(&channel_id);
        state.deleted.push(channel_id);
        Ok(())
    }

    async fn move_member(
        &self,
        _guild_id: GuildId,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().await;
        if state.fail_moves {
            return Err(PlatformError::Http {
                status: 400,
                code: 40032,
                message: "Target user is not connected to voice.".to_string(),
            });
        }
        if !state.channels.contains_key(&channel_id) {
            return Err(PlatformError::NotFound);
        }
        for members in state.voice.values_mut() {
            members.retain(|m| *m != user_id);
        }
        state.voice.entry(channel_id).or_default().push(user_id);
        state.moves.push((user_id, channel_id));
        Ok(())
    }

    async fn send_notice(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
        notice: &Notice,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().await;
        if !state.channels.contains_key(&channel_id) {
            return Err(PlatformError::NotFound);
        }
        state.notices.push((channel_id, notice.clone()));
        Ok(())
    }
}

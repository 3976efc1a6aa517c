//! [`ChatPlatform`] backed by serenity's HTTP client and gateway cache.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    Cache, Channel, ChannelType as DiscordChannelType, Colour, CreateChannel, CreateEmbed,
    CreateMessage, EditChannel, GuildChannel, Http, PermissionOverwrite as DiscordOverwrite,
    PermissionOverwriteType, Permissions,
};
use serenity::all::{
    ChannelId as DiscordChannelId, GuildId as DiscordGuildId, RoleId as DiscordRoleId,
    UserId as DiscordUserId,
};
use serenity::http::HttpError;

use crate::domain::{
    ChannelId, GuildId, OverwriteTarget, Overwrites, PermissionOverwrite, RoleId, UserId,
};
use crate::platform::{
    ChannelInfo, ChannelType, ChatPlatform, NewChannel, Notice, NoticeLevel, PlatformError,
};

const REASON: &str = "voice channel lifecycle";

/// Serenity-backed platform. Reads prefer the cache and fall back to HTTP.
#[derive(Clone)]
pub struct DiscordPlatform {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl std::fmt::Debug for DiscordPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordPlatform").finish_non_exhaustive()
    }
}

impl DiscordPlatform {
    /// Wraps a client's HTTP handle and cache.
    #[must_use]
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }

    fn cached_channel(&self, guild_id: GuildId, channel_id: ChannelId) -> Option<ChannelInfo> {
        let guild = self.cache.guild(to_guild(guild_id))?;
        guild.channels.get(&to_channel(channel_id)).map(channel_info)
    }
}

fn to_guild(id: GuildId) -> DiscordGuildId {
    DiscordGuildId::new(id.get())
}

fn to_channel(id: ChannelId) -> DiscordChannelId {
    DiscordChannelId::new(id.get())
}

fn to_user(id: UserId) -> DiscordUserId {
    DiscordUserId::new(id.get())
}

fn to_role(id: RoleId) -> DiscordRoleId {
    DiscordRoleId::new(id.get())
}

fn bits(overwrite: &PermissionOverwrite) -> [(Permissions, Option<bool>); 5] {
    [
        (Permissions::VIEW_CHANNEL, overwrite.view_channel),
        (Permissions::CONNECT, overwrite.connect),
        (Permissions::SPEAK, overwrite.speak),
        (Permissions::MANAGE_CHANNELS, overwrite.manage_channels),
        (Permissions::MANAGE_ROLES, overwrite.manage_permissions),
    ]
}

fn managed_bits() -> Permissions {
    Permissions::VIEW_CHANNEL
        | Permissions::CONNECT
        | Permissions::SPEAK
        | Permissions::MANAGE_CHANNELS
        | Permissions::MANAGE_ROLES
}

fn to_discord_overwrites(overwrites: &Overwrites) -> Vec<DiscordOverwrite> {
    overwrites
        .iter()
        .map(|(target, overwrite)| {
            let mut allow = Permissions::from_bits_truncate(overwrite.other_allow) - managed_bits();
            let mut deny = Permissions::from_bits_truncate(overwrite.other_deny) - managed_bits();
            for (bit, value) in bits(overwrite) {
                match value {
                    Some(true) => allow |= bit,
                    Some(false) => deny |= bit,
                    None => {}
                }
            }
            let kind = match target {
                OverwriteTarget::Role(role) => PermissionOverwriteType::Role(to_role(*role)),
                OverwriteTarget::Member(user) => PermissionOverwriteType::Member(to_user(*user)),
            };
            DiscordOverwrite { allow, deny, kind }
        })
        .collect()
}

fn tristate(overwrite: &DiscordOverwrite, bit: Permissions) -> Option<bool> {
    if overwrite.allow.contains(bit) {
        Some(true)
    } else if overwrite.deny.contains(bit) {
        Some(false)
    } else {
        None
    }
}

/// Managed bits become tri-states, everything else is kept raw.
fn from_discord_overwrites(overwrites: &[DiscordOverwrite]) -> Overwrites {
    overwrites
        .iter()
        .filter_map(|o| {
            let target = match o.kind {
                PermissionOverwriteType::Role(role) => OverwriteTarget::Role(RoleId::new(role.get())),
                PermissionOverwriteType::Member(user) => {
                    OverwriteTarget::Member(UserId::new(user.get()))
                }
                _ => return None,
            };
            let mut overwrite = PermissionOverwrite::new();
            overwrite.view_channel = tristate(o, Permissions::VIEW_CHANNEL);
            overwrite.connect = tristate(o, Permissions::CONNECT);
            overwrite.speak = tristate(o, Permissions::SPEAK);
            overwrite.manage_channels = tristate(o, Permissions::MANAGE_CHANNELS);
            overwrite.manage_permissions = tristate(o, Permissions::MANAGE_ROLES);
            overwrite.other_allow = (o.allow - managed_bits()).bits();
            overwrite.other_deny = (o.deny - managed_bits()).bits();
            Some((target, overwrite))
        })
        .collect()
}

fn channel_info(channel: &GuildChannel) -> ChannelInfo {
    let kind = match channel.kind {
        DiscordChannelType::Voice | DiscordChannelType::Stage => ChannelType::Voice,
        DiscordChannelType::Category => ChannelType::Category,
        _ => ChannelType::Text,
    };
    ChannelInfo {
        id: ChannelId::new(channel.id.get()),
        name: channel.name.clone(),
        kind,
        parent_id: channel.parent_id.map(|p| ChannelId::new(p.get())),
        overwrites: from_discord_overwrites(&channel.permission_overwrites),
        has_messages: channel.last_message_id.is_some(),
    }
}

fn map_error(err: serenity::Error) -> PlatformError {
    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            let status = response.status_code.as_u16();
            if status == 404 {
                PlatformError::NotFound
            } else {
                PlatformError::Http {
                    status,
                    code: i64::try_from(response.error.code).unwrap_or_default(),
                    message: response.error.message,
                }
            }
        }
        other => PlatformError::Unavailable(other.to_string()),
    }
}

fn colour(level: NoticeLevel) -> Colour {
    match level {
        NoticeLevel::Success => Colour::DARK_GREEN,
        NoticeLevel::Warning => Colour::ORANGE,
        NoticeLevel::Error => Colour::RED,
    }
}

#[async_trait]
impl ChatPlatform for DiscordPlatform {
    async fn channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Option<ChannelInfo>, PlatformError> {
        if let Some(info) = self.cached_channel(guild_id, channel_id) {
            return Ok(Some(info));
        }
        match self.http.get_channel(to_channel(channel_id)).await {
            Ok(Channel::Guild(channel)) if channel.guild_id == to_guild(guild_id) => {
                Ok(Some(channel_info(&channel)))
            }
            Ok(_) => Ok(None),
            Err(e) => match map_error(e) {
                PlatformError::NotFound => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn voice_members(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Vec<UserId>, PlatformError> {
        let guild = self
            .cache
            .guild(to_guild(guild_id))
            .ok_or_else(|| PlatformError::Unavailable(format!("guild {guild_id} not cached")))?;
        let channel = to_channel(channel_id);
        let mut members: Vec<UserId> = guild
            .voice_states
            .values()
            .filter(|state| state.channel_id == Some(channel))
            .map(|state| UserId::new(state.user_id.get()))
            .collect();
        members.sort_unstable();
        Ok(members)
    }

    async fn role_exists(&self, guild_id: GuildId, role_id: RoleId) -> Result<bool, PlatformError> {
        if let Some(guild) = self.cache.guild(to_guild(guild_id)) {
            return Ok(guild.roles.contains_key(&to_role(role_id)));
        }
        let roles = self
            .http
            .get_guild_roles(to_guild(guild_id))
            .await
            .map_err(map_error)?;
        Ok(roles.iter().any(|role| role.id == to_role(role_id)))
    }

    async fn is_administrator(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<bool, PlatformError> {
        let cached_roles = {
            let guild = self
                .cache
                .guild(to_guild(guild_id))
                .ok_or_else(|| PlatformError::Unavailable(format!("guild {guild_id} not cached")))?;
            if guild.owner_id == to_user(user_id) {
                return Ok(true);
            }
            guild.members.get(&to_user(user_id)).map(|m| m.roles.clone())
        };
        let member_roles = match cached_roles {
            Some(roles) => roles,
            None => {
                self.http
                    .get_member(to_guild(guild_id), to_user(user_id))
                    .await
                    .map_err(map_error)?
                    .roles
            }
        };

        let guild = self
            .cache
            .guild(to_guild(guild_id))
            .ok_or_else(|| PlatformError::Unavailable(format!("guild {guild_id} not cached")))?;
        let everyone = to_role(guild_id.everyone_role());
        Ok(member_roles
            .iter()
            .chain(std::iter::once(&everyone))
            .filter_map(|role| guild.roles.get(role))
            .any(|role| role.permissions.administrator()))
    }

    async fn create_channel(
        &self,
        guild_id: GuildId,
        channel: NewChannel,
    ) -> Result<ChannelInfo, PlatformError> {
        let kind = match channel.kind {
            ChannelType::Text => DiscordChannelType::Text,
            ChannelType::Voice => DiscordChannelType::Voice,
            ChannelType::Category => DiscordChannelType::Category,
        };
        let mut builder = CreateChannel::new(channel.name)
            .kind(kind)
            .permissions(to_discord_overwrites(&channel.overwrites))
            .audit_log_reason(REASON);
        if let Some(parent) = channel.parent_id {
            builder = builder.category(to_channel(parent));
        }
        if let Some(position) = channel.position {
            builder = builder.position(position);
        }
        let created = to_guild(guild_id)
            .create_channel(self.http.as_ref(), builder)
            .await
            .map_err(map_error)?;
        Ok(channel_info(&created))
    }

    async fn edit_overwrites(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
        overwrites: &Overwrites,
    ) -> Result<(), PlatformError> {
        to_channel(channel_id)
            .edit(
                self.http.as_ref(),
                EditChannel::new()
                    .permissions(to_discord_overwrites(overwrites))
                    .audit_log_reason(REASON),
            )
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn set_parent(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
        parent_id: ChannelId,
    ) -> Result<(), PlatformError> {
        to_channel(channel_id)
            .edit(
                self.http.as_ref(),
                EditChannel::new()
                    .category(Some(to_channel(parent_id)))
                    .audit_log_reason(REASON),
            )
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn delete_channel(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), PlatformError> {
        to_channel(channel_id)
            .delete(self.http.as_ref())
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn move_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<(), PlatformError> {
        to_guild(guild_id)
            .move_member(self.http.as_ref(), to_user(user_id), to_channel(channel_id))
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn send_notice(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
        notice: &Notice,
    ) -> Result<(), PlatformError> {
        let embed = CreateEmbed::new()
            .title(&notice.title)
            .description(&notice.body)
            .colour(colour(notice.level));
        to_channel(channel_id)
            .send_message(self.http.as_ref(), CreateMessage::new().embed(embed))
            .await
            .map_err(map_error)?;
        Ok(())
    }
}

//! Chat platform seam.
//!
//! The lifecycle never talks to Discord directly. It goes through
//! [`ChatPlatform`], which the serenity adapter in [`crate::discord`]
//! implements. Lookups return `Option` so a channel deleted out of band is an
//! ordinary value, not an error.

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{ChannelId, GuildId, Overwrites, RoleId, UserId};

/// Platform channel flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// Text channel.
    Text,
    /// Voice channel.
    Voice,
    /// Category grouping other channels.
    Category,
}

/// Snapshot of a guild channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Channel id.
    pub id: ChannelId,
    /// Display name.
    pub name: String,
    /// Channel flavour.
    pub kind: ChannelType,
    /// Parent category, if any.
    pub parent_id: Option<ChannelId>,
    /// Current overwrites.
    pub overwrites: Overwrites,
    /// Whether a message was ever sent in the channel.
    pub has_messages: bool,
}

/// Parameters for a channel to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChannel {
    /// Display name.
    pub name: String,
    /// Channel flavour.
    pub kind: ChannelType,
    /// Parent category.
    pub parent_id: Option<ChannelId>,
    /// Initial overwrites.
    pub overwrites: Overwrites,
    /// Sidebar position.
    pub position: Option<u16>,
}

impl NewChannel {
    fn of(kind: ChannelType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            parent_id: None,
            overwrites: Overwrites::new(),
            position: None,
        }
    }

    /// A voice channel named `name`.
    #[must_use]
    pub fn voice(name: impl Into<String>) -> Self {
        Self::of(ChannelType::Voice, name)
    }

    /// A text channel named `name`.
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::of(ChannelType::Text, name)
    }

    /// A category named `name`.
    #[must_use]
    pub fn category(name: impl Into<String>) -> Self {
        Self::of(ChannelType::Category, name)
    }

    /// Places the channel under `parent`.
    #[must_use]
    pub fn in_category(mut self, parent: Option<ChannelId>) -> Self {
        self.parent_id = parent;
        self
    }

    /// Sets the initial overwrites.
    #[must_use]
    pub fn with_overwrites(mut self, overwrites: Overwrites) -> Self {
        self.overwrites = overwrites;
        self
    }

    /// Sets the sidebar position.
    #[must_use]
    pub fn at_position(mut self, position: u16) -> Self {
        self.position = Some(position);
        self
    }
}

/// Severity of a notice, rendered as the embed colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Green.
    Success,
    /// Orange.
    Warning,
    /// Red.
    Error,
}

/// Formatted message sent to a log channel or back to an invoker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Embed title.
    pub title: String,
    /// Embed body.
    pub body: String,
    /// Severity.
    pub level: NoticeLevel,
}

impl Notice {
    /// Green notice.
    #[must_use]
    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Success, title, body)
    }

    /// Orange notice.
    #[must_use]
    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Warning, title, body)
    }

    /// Red notice.
    #[must_use]
    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Error, title, body)
    }

    fn with_level(level: NoticeLevel, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            level,
        }
    }
}

/// Failure of a platform call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// The addressed object does not exist (any more).
    #[error("object not found")]
    NotFound,

    /// The platform rejected the request.
    #[error("request rejected ({status}, code {code}): {message}")]
    Http {
        /// HTTP status.
        status: u16,
        /// Platform-specific JSON error code.
        code: i64,
        /// Platform-provided message.
        message: String,
    },

    /// Transport failure or missing cache state.
    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

impl PlatformError {
    /// Returns `true` for [`PlatformError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Operations the lifecycle needs from the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync + std::fmt::Debug {
    /// Looks up a guild channel. `Ok(None)` when it does not exist.
    async fn channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Option<ChannelInfo>, PlatformError>;

    /// Members currently connected to a voice channel. Empty when the
    /// channel is unknown.
    async fn voice_members(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Vec<UserId>, PlatformError>;

    /// Whether `role_id` exists in the guild.
    async fn role_exists(&self, guild_id: GuildId, role_id: RoleId) -> Result<bool, PlatformError>;

    /// Whether `user_id` holds the administrator permission.
    async fn is_administrator(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<bool, PlatformError>;

    /// Creates a channel and returns its snapshot.
    async fn create_channel(
        &self,
        guild_id: GuildId,
        channel: NewChannel,
    ) -> Result<ChannelInfo, PlatformError>;

    /// Replaces a channel's overwrites.
    async fn edit_overwrites(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        overwrites: &Overwrites,
    ) -> Result<(), PlatformError>;

    /// Moves a channel under another category.
    async fn set_parent(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        parent_id: ChannelId,
    ) -> Result<(), PlatformError>;

    /// Deletes a channel.
    async fn delete_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), PlatformError>;

    /// Moves a connected member into a voice channel.
    async fn move_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<(), PlatformError>;

    /// Sends a notice to a text channel.
    async fn send_notice(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        notice: &Notice,
    ) -> Result<(), PlatformError>;
}

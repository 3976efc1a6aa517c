//! Database models for settings and created channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ChannelId, ChannelKind, GuildId, SettingName};

/// A row of the `setting` table.
///
/// Names are not unique: several trigger channels may share `"pub"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    /// Owning guild.
    pub guild_id: GuildId,
    /// Setting name (see [`SettingName`]); other features may store more.
    pub setting: String,
    /// Free-form label for the value.
    pub value_name: String,
    /// Target id (channel, role or flag value).
    pub value_id: u64,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Version tag of the writer.
    pub version: String,
}

impl Setting {
    /// Builds a row stamped with the current time.
    #[must_use]
    pub fn new(
        guild_id: GuildId,
        name: SettingName,
        value_name: impl Into<String>,
        value_id: u64,
        version: impl Into<String>,
    ) -> Self {
        Self {
            guild_id,
            setting: name.as_str().to_string(),
            value_name: value_name.into(),
            value_id,
            created_at: Utc::now(),
            version: version.into(),
        }
    }
}

/// A row of the `created_channels` table: one live managed pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedChannel {
    /// Owning guild.
    pub guild_id: GuildId,
    /// Public or private.
    pub kind: ChannelKind,
    /// Managed voice channel.
    pub voice_channel_id: ChannelId,
    /// Linked text channel.
    pub text_channel_id: ChannelId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Version tag of the writer.
    pub version: String,
}

impl CreatedChannel {
    /// Builds a record stamped with the current time.
    #[must_use]
    pub fn new(
        guild_id: GuildId,
        kind: ChannelKind,
        voice_channel_id: ChannelId,
        text_channel_id: ChannelId,
        version: impl Into<String>,
    ) -> Self {
        Self {
            guild_id,
            kind,
            voice_channel_id,
            text_channel_id,
            created_at: Utc::now(),
            version: version.into(),
        }
    }
}

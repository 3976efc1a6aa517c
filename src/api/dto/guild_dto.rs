//! Guild-scoped DTOs for settings and managed channel listings.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::persistence::{CreatedChannel, Setting};

/// One stored setting row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SettingDto {
    /// Setting name (`"pub"`, `"archive"`, ...).
    pub setting: String,
    /// Free-form label.
    pub value_name: String,
    /// Target id.
    pub value_id: String,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Writer version tag.
    pub version: String,
}

impl From<Setting> for SettingDto {
    fn from(row: Setting) -> Self {
        Self {
            setting: row.setting,
            value_name: row.value_name,
            value_id: row.value_id.to_string(),
            created_at: row.created_at,
            version: row.version,
        }
    }
}

/// Response body for `GET /guilds/{guild_id}/settings`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    /// Guild the settings belong to.
    pub guild_id: String,
    /// Rows in insertion order.
    pub data: Vec<SettingDto>,
}

/// One live managed pair.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedChannelDto {
    /// `"pub"` or `"priv"`.
    pub kind: String,
    /// Voice channel id.
    pub voice_channel_id: String,
    /// Linked text channel id.
    pub text_channel_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Writer version tag.
    pub version: String,
}

impl From<CreatedChannel> for CreatedChannelDto {
    fn from(row: CreatedChannel) -> Self {
        Self {
            kind: row.kind.as_str().to_string(),
            voice_channel_id: row.voice_channel_id.to_string(),
            text_channel_id: row.text_channel_id.to_string(),
            created_at: row.created_at,
            version: row.version,
        }
    }
}

/// Response body for `GET /guilds/{guild_id}/channels`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChannelsResponse {
    /// Guild the pairs belong to.
    pub guild_id: String,
    /// Number of live pairs.
    pub total: usize,
    /// Pairs in creation order.
    pub data: Vec<CreatedChannelDto>,
}

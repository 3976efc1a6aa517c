//! Names of the per-guild settings rows this service reads or writes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ChannelKind;

/// Well-known values of the `setting` column.
///
/// `pub-channel` and `priv-channel` are legacy aliases of `pub` and `priv`;
/// both spellings register trigger channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettingName {
    /// Legacy public trigger channel.
    #[serde(rename = "pub-channel")]
    PubChannel,
    /// Public trigger channel.
    #[serde(rename = "pub")]
    Pub,
    /// Legacy private trigger channel.
    #[serde(rename = "priv-channel")]
    PrivChannel,
    /// Private trigger channel.
    #[serde(rename = "priv")]
    Priv,
    /// Category receiving text channels of emptied pairs.
    #[serde(rename = "archive")]
    Archive,
    /// Channel receiving lifecycle notices.
    #[serde(rename = "log")]
    Log,
    /// Non-zero when creators of public channels may rename them.
    #[serde(rename = "edit_channel")]
    EditChannel,
    /// Role treated as the guild's default role by other features.
    #[serde(rename = "default_role")]
    DefaultRole,
}

impl SettingName {
    /// Trigger aliases in lookup order.
    pub const TRIGGERS: [Self; 4] = [Self::PubChannel, Self::Pub, Self::PrivChannel, Self::Priv];

    /// Value stored in the `setting` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PubChannel => "pub-channel",
            Self::Pub => "pub",
            Self::PrivChannel => "priv-channel",
            Self::Priv => "priv",
            Self::Archive => "archive",
            Self::Log => "log",
            Self::EditChannel => "edit_channel",
            Self::DefaultRole => "default_role",
        }
    }

    /// Channel kind created when a trigger registered under this name is joined.
    #[must_use]
    pub const fn trigger_kind(self) -> Option<ChannelKind> {
        match self {
            Self::PubChannel | Self::Pub => Some(ChannelKind::Public),
            Self::PrivChannel | Self::Priv => Some(ChannelKind::Private),
            _ => None,
        }
    }
}

impl fmt::Display for SettingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pub-channel" => Self::PubChannel,
            "pub" => Self::Pub,
            "priv-channel" => Self::PrivChannel,
            "priv" => Self::Priv,
            "archive" => Self::Archive,
            "log" => Self::Log,
            "edit_channel" => Self::EditChannel,
            "default_role" => Self::DefaultRole,
            other => return Err(format!("unknown setting: {other}")),
        })
    }
}

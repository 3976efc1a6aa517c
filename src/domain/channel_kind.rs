//! Public / private flavour of a managed channel pair.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::SettingName;

/// Flavour of a managed voice channel.
///
/// Stored in the registry as the short tags `"pub"` and `"priv"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Anyone who can see the category may join.
    Public,
    /// Only the creator connects by default and manages who else may.
    Private,
}

impl ChannelKind {
    /// Both kinds, public first.
    pub const ALL: [Self; 2] = [Self::Public, Self::Private];

    /// Storage tag used in the `created_channels` and `setting` tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "pub",
            Self::Private => "priv",
        }
    }

    /// Setting names that register a trigger channel of this kind.
    #[must_use]
    pub const fn trigger_aliases(self) -> [SettingName; 2] {
        match self {
            Self::Public => [SettingName::PubChannel, SettingName::Pub],
            Self::Private => [SettingName::PrivChannel, SettingName::Priv],
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored channel-type tag is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown channel kind: {0}")]
pub struct UnknownChannelKind(pub String);

impl FromStr for ChannelKind {
    type Err = UnknownChannelKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pub" => Ok(Self::Public),
            "priv" => Ok(Self::Private),
            other => Err(UnknownChannelKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trip() {
        for kind in ChannelKind::ALL {
            assert_eq!(kind.as_str().parse::<ChannelKind>(), Ok(kind));
        }
        assert!("public".parse::<ChannelKind>().is_err());
    }

    #[test]
    fn aliases_map_back_to_kind() {
        for kind in ChannelKind::ALL {
            for alias in kind.trigger_aliases() {
                assert_eq!(alias.trigger_kind(), Some(kind));
            }
        }
    }
}

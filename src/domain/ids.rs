//! Type-safe snowflake identifiers.
//!
//! Every object on the chat platform is addressed by a 64-bit snowflake.
//! Wrapping each kind in its own newtype keeps a guild id from being passed
//! where a channel id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw snowflake.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw snowflake.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

snowflake!(
    /// Identifier of a guild (server).
    GuildId
);
snowflake!(
    /// Identifier of any guild channel: voice, text or category.
    ChannelId
);
snowflake!(
    /// Identifier of a user / guild member.
    UserId
);
snowflake!(
    /// Identifier of a guild role.
    RoleId
);

impl GuildId {
    /// The guild's default (`@everyone`) role shares the guild's snowflake.
    #[must_use]
    pub const fn everyone_role(self) -> RoleId {
        RoleId(self.0)
    }
}

impl ChannelId {
    /// Channel mention markup (`<#id>`).
    #[must_use]
    pub fn mention(self) -> String {
        format!("<#{}>", self.0)
    }
}

impl UserId {
    /// User mention markup (`<@id>`).
    #[must_use]
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl RoleId {
    /// Role mention markup (`<@&id>`).
    #[must_use]
    pub fn mention(self) -> String {
        format!("<@&{}>", self.0)
    }
}

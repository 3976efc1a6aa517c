//! Domain events reflecting channel-pair lifecycle transitions.
//!
//! Every state change emits a [`LifecycleEvent`] through the
//! [`super::EventBus`]. Events are streamed to WebSocket subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ChannelId, ChannelKind, GuildId, UserId};

/// What happened to the linked text channel when its pair was retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextDisposition {
    /// Moved into the archive category with its history.
    Archived,
    /// Deleted outright.
    Deleted,
    /// Already gone from the platform.
    Missing,
}

/// Domain event emitted after every lifecycle transition.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A member joined a trigger channel and got a new pair.
    PairCreated {
        /// Guild identifier.
        guild_id: GuildId,
        /// Public or private.
        kind: ChannelKind,
        /// New voice channel.
        voice_channel_id: ChannelId,
        /// New linked text channel.
        text_channel_id: ChannelId,
        /// Member the pair was created for.
        owner_id: UserId,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Text channel visibility was recomputed from the voice members.
    MembershipSynced {
        /// Guild identifier.
        guild_id: GuildId,
        /// Managed voice channel.
        voice_channel_id: ChannelId,
        /// Linked text channel.
        text_channel_id: ChannelId,
        /// Number of members granted view.
        member_count: usize,
        /// Sync timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The last member left and the pair was torn down.
    PairRetired {
        /// Guild identifier.
        guild_id: GuildId,
        /// Deleted voice channel.
        voice_channel_id: ChannelId,
        /// Linked text channel.
        text_channel_id: ChannelId,
        /// What happened to the text channel.
        disposition: TextDisposition,
        /// Teardown timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The creator could not be moved into the new pair; it was removed.
    CreationAborted {
        /// Guild identifier.
        guild_id: GuildId,
        /// Removed voice channel.
        voice_channel_id: ChannelId,
        /// Linked text channel.
        text_channel_id: ChannelId,
        /// Member the pair was created for.
        owner_id: UserId,
        /// Abort timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Teardown failed and the pair was left live.
    TeardownAborted {
        /// Guild identifier.
        guild_id: GuildId,
        /// Voice channel left in place.
        voice_channel_id: ChannelId,
        /// Text channel left in place.
        text_channel_id: ChannelId,
        /// Failure description.
        reason: String,
        /// Abort timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl LifecycleEvent {
    /// Returns the guild this event belongs to.
    #[must_use]
    pub const fn guild_id(&self) -> GuildId {
        match self {
            Self::PairCreated { guild_id, .. }
            | Self::MembershipSynced { guild_id, .. }
            | Self::PairRetired { guild_id, .. }
            | Self::CreationAborted { guild_id, .. }
            | Self::TeardownAborted { guild_id, .. } => *guild_id,
        }
    }

    /// Returns the voice channel this event concerns.
    #[must_use]
    pub const fn voice_channel_id(&self) -> ChannelId {
        match self {
            Self::PairCreated {
                voice_channel_id, ..
            }
            | Self::MembershipSynced {
                voice_channel_id, ..
            }
            | Self::PairRetired {
                voice_channel_id, ..
            }
            | Self::CreationAborted {
                voice_channel_id, ..
            }
            | Self::TeardownAborted {
                voice_channel_id, ..
            } => *voice_channel_id,
        }
    }

    /// Returns the snake_case event type string.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::PairCreated { .. } => "pair_created",
            Self::MembershipSynced { .. } => "membership_synced",
            Self::PairRetired { .. } => "pair_retired",
            Self::CreationAborted { .. } => "creation_aborted",
            Self::TeardownAborted { .. } => "teardown_aborted",
        }
    }
}

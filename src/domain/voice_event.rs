//! Voice-state change delivered by the chat platform.

use serde::Serialize;

use super::{ChannelId, GuildId, UserId};

/// The member whose voice state changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRef {
    /// Member id.
    pub id: UserId,
    /// Guild display name, used in generated channel names.
    pub display_name: String,
}

impl MemberRef {
    /// Creates a member reference.
    #[must_use]
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }

    /// Mention markup for notices.
    #[must_use]
    pub fn mention(&self) -> String {
        self.id.mention()
    }
}

/// A member joined, left or switched voice channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceStateUpdate {
    /// Guild the change happened in.
    pub guild_id: GuildId,
    /// Member whose state changed.
    pub member: MemberRef,
    /// Voice channel before the change.
    pub before: Option<ChannelId>,
    /// Voice channel after the change.
    pub after: Option<ChannelId>,
}

impl VoiceStateUpdate {
    /// Returns `true` if the member stayed in the same channel (mute,
    /// deafen, stream toggles).
    #[must_use]
    pub fn is_same_channel(&self) -> bool {
        self.before == self.after
    }
}

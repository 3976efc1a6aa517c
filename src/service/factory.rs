//! Creates a voice channel plus its member-scoped text channel and registers
//! the pair.

use std::sync::Arc;

use crate::domain::{
    ChannelKind, ChannelNames, GuildId, MemberRef, OverwriteTarget, Overwrites,
    PermissionOverwrite,
};
use crate::error::BotError;
use crate::platform::{ChannelInfo, ChatPlatform, NewChannel};
use crate::persistence::{CreatedChannel, Store};

/// A freshly created and registered pair.
#[derive(Debug, Clone)]
pub struct ChannelPair {
    /// Voice channel.
    pub voice: ChannelInfo,
    /// Linked text channel.
    pub text: ChannelInfo,
    /// Registry row written for the pair.
    pub record: CreatedChannel,
}

/// Creation failed part-way. Channels that were created are listed so the
/// caller can clean them up; nothing is rolled back here.
#[derive(Debug, thiserror::Error)]
#[error("channel pair creation failed: {source}")]
pub struct PairFailure {
    /// Channels created before the failure, in creation order.
    pub orphans: Vec<ChannelInfo>,
    /// What went wrong.
    #[source]
    pub source: BotError,
}

/// Channel Pair Factory.
#[derive(Debug, Clone)]
pub struct ChannelFactory {
    platform: Arc<dyn ChatPlatform>,
    store: Arc<dyn Store>,
    version: String,
}

impl ChannelFactory {
    /// Creates a factory stamping registry rows with `version`.
    #[must_use]
    pub fn new(platform: Arc<dyn ChatPlatform>, store: Arc<dyn Store>, version: String) -> Self {
        Self {
            platform,
            store,
            version,
        }
    }

    /// Creates a voice channel next to `trigger` with `voice_overwrites`, a
    /// text channel only `member` can see, and the registry row linking them.
    ///
    /// # Errors
    ///
    /// Returns a [`PairFailure`] naming any channel already created.
    pub async fn create_pair(
        &self,
        guild_id: GuildId,
        trigger: &ChannelInfo,
        member: &MemberRef,
        voice_overwrites: Overwrites,
        names: ChannelNames,
        kind: ChannelKind,
    ) -> Result<ChannelPair, PairFailure> {
        let voice = self
            .platform
            .create_channel(
                guild_id,
                NewChannel::voice(names.voice)
                    .in_category(trigger.parent_id)
                    .with_overwrites(voice_overwrites),
            )
            .await
            .map_err(|e| PairFailure {
                orphans: Vec::new(),
                source: e.into(),
            })?;

        let text_overwrites: Overwrites = [
            (
                OverwriteTarget::Member(member.id),
                PermissionOverwrite::new().view_channel(true),
            ),
            (
                OverwriteTarget::Role(guild_id.everyone_role()),
                PermissionOverwrite::new().view_channel(false),
            ),
        ]
        .into_iter()
        .collect();

        let text = match self
            .platform
            .create_channel(
                guild_id,
                NewChannel::text(names.text)
                    .in_category(trigger.parent_id)
                    .with_overwrites(text_overwrites),
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                return Err(PairFailure {
                    orphans: vec![voice],
                    source: e.into(),
                });
            }
        };

        let record = CreatedChannel::new(guild_id, kind, voice.id, text.id, self.version.clone());
        if let Err(source) = self.store.insert_created_channel(&record).await {
            return Err(PairFailure {
                orphans: vec![voice, text],
                source,
            });
        }

        tracing::debug!(
            %guild_id,
            voice_channel_id = %voice.id,
            text_channel_id = %text.id,
            %kind,
            "channel pair registered"
        );
        Ok(ChannelPair {
            voice,
            text,
            record,
        })
    }
}

//! `setup-voice`: provisions the voice category and both trigger channels.

use std::sync::Arc;

use serde::Serialize;

use super::checker::EventCheck;
use crate::domain::{
    ChannelId, ChannelKind, GuildId, GuildLocks, OverwriteTarget, Overwrites, PermissionOverwrite,
    RoleId, SettingName, UserId,
};
use crate::error::BotError;
use crate::persistence::{Setting, Store};
use crate::platform::{ChatPlatform, NewChannel, Notice};

/// Name of the provisioned category.
pub const CATEGORY_NAME: &str = "Voice Channels";
/// Name of the public trigger channel.
pub const PUBLIC_TRIGGER_NAME: &str = "╔create-voice-channel";
/// Name of the private trigger channel.
pub const PRIVATE_TRIGGER_NAME: &str = "╠new-private-channel";

/// Outcome of a setup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupReport {
    /// Created category.
    pub category_id: ChannelId,
    /// Created public trigger.
    pub public_trigger: ChannelId,
    /// Created private trigger.
    pub private_trigger: ChannelId,
    /// Whether the triggers were registered as settings.
    pub registered: bool,
    /// Notices for the invoker, in order.
    pub notices: Vec<Notice>,
}

/// Setup Command.
#[derive(Debug, Clone)]
pub struct SetupService {
    store: Arc<dyn Store>,
    platform: Arc<dyn ChatPlatform>,
    locks: Arc<GuildLocks>,
    set_limit: usize,
    prefix: String,
    version: String,
}

impl SetupService {
    /// Creates a new `SetupService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        platform: Arc<dyn ChatPlatform>,
        locks: Arc<GuildLocks>,
        set_limit: usize,
        prefix: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            store,
            platform,
            locks,
            set_limit,
            prefix: prefix.into(),
            version: version.into(),
        }
    }

    /// Runs `setup-voice` for `invoker`, optionally restricting the category
    /// to the role named by `role_arg`.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Forbidden`] if `invoker` is not an administrator,
    /// or a platform/store error if provisioning fails.
    pub async fn setup_voice(
        &self,
        guild_id: GuildId,
        invoker: UserId,
        role_arg: Option<&str>,
    ) -> Result<SetupReport, BotError> {
        if !self.platform.is_administrator(guild_id, invoker).await? {
            return Err(BotError::Forbidden(
                "setup-voice requires the administrator permission".to_string(),
            ));
        }
        let _guard = self.locks.acquire(guild_id).await;
        let mut notices = Vec::new();

        let open = PermissionOverwrite::new()
            .view_channel(true)
            .connect(true)
            .speak(true);
        let closed = PermissionOverwrite::new()
            .view_channel(false)
            .connect(false)
            .speak(false);
        let everyone = OverwriteTarget::Role(guild_id.everyone_role());

        let mut overwrites = Overwrites::new();
        overwrites.insert(everyone, open);
        if let Some(arg) = role_arg {
            match self.resolve_role(guild_id, arg).await? {
                Some(role) => {
                    overwrites.insert(everyone, closed);
                    overwrites.insert(OverwriteTarget::Role(role), open);
                }
                None => {
                    tracing::info!(%guild_id, role = arg, "setup-voice got an invalid role");
                    notices.push(Notice::warning(
                        "No valid role",
                        "Hey, the given id is invalid, I'm trying to create the channels \
                         but with the default settings.",
                    ));
                }
            }
        }

        let category = self
            .platform
            .create_channel(
                guild_id,
                NewChannel::category(CATEGORY_NAME)
                    .with_overwrites(overwrites)
                    .at_position(0),
            )
            .await?;
        let public = self
            .platform
            .create_channel(
                guild_id,
                NewChannel::voice(PUBLIC_TRIGGER_NAME).in_category(Some(category.id)),
            )
            .await?;
        let private = self
            .platform
            .create_channel(
                guild_id,
                NewChannel::voice(PRIVATE_TRIGGER_NAME).in_category(Some(category.id)),
            )
            .await?;

        let check = EventCheck::new(self.store.as_ref(), guild_id);
        let mut registered = true;
        for kind in ChannelKind::ALL {
            if check.trigger_count(kind).await? >= self.set_limit {
                registered = false;
            }
        }

        if registered {
            for (name, channel) in [(SettingName::Pub, &public), (SettingName::Priv, &private)] {
                let row = Setting::new(guild_id, name, &channel.name, channel.id.get(), &self.version);
                self.store.insert_setting(&row).await?;
            }
            notices.push(Notice::success(
                "Successfully setup voice category",
                "Your category is set, have fun!\n\
                 Oh, yeah - you can change the channel names however you like :)",
            ));
        } else {
            tracing::warn!(%guild_id, limit = self.set_limit, "trigger limit reached, channels left unregistered");
            notices.push(Notice::warning(
                "Too many channels!",
                format!(
                    "Hey, you can't make me watch more than {limit} channels per creation type.\n\
                     If you wanna change the channels I watch use `{prefix}ds [channel-id]` \
                     to remove a channel from your settings.\n\
                     The channels were **created but aren't watched**, have a look at \
                     `{prefix}help settings` to add them manually after you removed other \
                     watched channels from the settings",
                    limit = self.set_limit,
                    prefix = self.prefix,
                ),
            ));
        }

        tracing::info!(
            %guild_id,
            %invoker,
            category_id = %category.id,
            registered,
            "voice category provisioned"
        );
        Ok(SetupReport {
            category_id: category.id,
            public_trigger: public.id,
            private_trigger: private.id,
            registered,
            notices,
        })
    }

    async fn resolve_role(&self, guild_id: GuildId, arg: &str) -> Result<Option<RoleId>, BotError> {
        let Some(role) = parse_role_id(arg) else {
            return Ok(None);
        };
        Ok(self
            .platform
            .role_exists(guild_id, role)
            .await?
            .then_some(role))
    }
}

/// Parses a role mention (`<@&id>`), a loose mention (`<@id>`) or a raw id.
#[must_use]
pub fn parse_role_id(arg: &str) -> Option<RoleId> {
    let trimmed = arg.trim();
    let inner = trimmed
        .strip_prefix("<@&")
        .or_else(|| trimmed.strip_prefix("<@"))
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(trimmed);
    inner.parse().ok()
}

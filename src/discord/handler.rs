//! Gateway event handler: routes voice-state updates and the `setup-voice`
//! command into the service layer.

use std::sync::Arc;

use serenity::all::{Context, EventHandler, GatewayIntents, Message, Ready, VoiceState};
use serenity::async_trait;
use tracing::{debug, info, warn};

use super::platform::DiscordPlatform;
use crate::config::BotConfig;
use crate::domain::{ChannelId, EventBus, GuildId, GuildLocks, MemberRef, UserId, VoiceStateUpdate};
use crate::error::BotError;
use crate::persistence::Store;
use crate::platform::{ChatPlatform, Notice};
use crate::service::{LifecycleService, SetupService};

/// A text command addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// `setup-voice [role]`.
    SetupVoice {
        /// Optional role mention or id.
        role: Option<&'a str>,
    },
}

/// Parses `content` as a command behind `prefix`.
#[must_use]
pub fn parse_command<'a>(prefix: &str, content: &'a str) -> Option<Command<'a>> {
    let rest = content.trim().strip_prefix(prefix)?;
    let mut words = rest.split_whitespace();
    match words.next()? {
        "setup-voice" => Some(Command::SetupVoice { role: words.next() }),
        _ => None,
    }
}

/// Handler for Discord gateway events.
pub struct VoiceHandler {
    store: Arc<dyn Store>,
    event_bus: EventBus,
    locks: Arc<GuildLocks>,
    set_limit: usize,
    prefix: String,
    version: String,
}

impl std::fmt::Debug for VoiceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceHandler")
            .field("prefix", &self.prefix)
            .field("set_limit", &self.set_limit)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl VoiceHandler {
    /// Builds the handler from shared state and configuration.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, event_bus: EventBus, config: &BotConfig) -> Self {
        Self {
            store,
            event_bus,
            locks: Arc::new(GuildLocks::new()),
            set_limit: config.set_limit,
            prefix: config.command_prefix.clone(),
            version: config.sql_version.clone(),
        }
    }

    /// Required gateway intents for the bot.
    #[must_use]
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::GUILD_VOICE_STATES
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }

    fn platform(ctx: &Context) -> Arc<dyn ChatPlatform> {
        Arc::new(DiscordPlatform::new(
            Arc::clone(&ctx.http),
            Arc::clone(&ctx.cache),
        ))
    }

    fn lifecycle(&self, platform: Arc<dyn ChatPlatform>) -> LifecycleService {
        LifecycleService::new(
            Arc::clone(&self.store),
            platform,
            self.event_bus.clone(),
            Arc::clone(&self.locks),
            self.version.clone(),
        )
    }

    fn setup(&self, platform: Arc<dyn ChatPlatform>) -> SetupService {
        SetupService::new(
            Arc::clone(&self.store),
            platform,
            Arc::clone(&self.locks),
            self.set_limit,
            self.prefix.as_str(),
            self.version.as_str(),
        )
    }

    async fn run_setup(&self, ctx: &Context, msg: &Message, guild_id: GuildId, role: Option<&str>) {
        let platform = Self::platform(ctx);
        let channel = ChannelId::new(msg.channel_id.get());
        if let Err(e) = msg.channel_id.broadcast_typing(&ctx.http).await {
            debug!(error = %e, "typing indicator failed");
        }

        let invoker = UserId::new(msg.author.id.get());
        let notices = match self.setup(Arc::clone(&platform)).setup_voice(guild_id, invoker, role).await {
            Ok(report) => report.notices,
            Err(BotError::Forbidden(reason)) => {
                info!(%guild_id, %invoker, "setup-voice refused");
                vec![Notice::error("Missing permissions", reason)]
            }
            Err(e) => {
                warn!(%guild_id, %invoker, error = %e, "setup-voice failed");
                vec![Notice::error("Setup failed", e.to_string())]
            }
        };

        for notice in &notices {
            if let Err(e) = platform.send_notice(guild_id, channel, notice).await {
                warn!(%guild_id, channel_id = %channel, error = %e, "failed to answer setup-voice");
            }
        }
    }
}

#[async_trait]
impl EventHandler for VoiceHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let Some(guild_id) = new.guild_id else {
            return;
        };
        let user_id = UserId::new(new.user_id.get());
        let display_name = new
            .member
            .as_ref()
            .map_or_else(|| user_id.to_string(), |m| m.display_name().to_string());

        let event = VoiceStateUpdate {
            guild_id: GuildId::new(guild_id.get()),
            member: MemberRef::new(user_id, display_name),
            before: old
                .and_then(|state| state.channel_id)
                .map(|c| ChannelId::new(c.get())),
            after: new.channel_id.map(|c| ChannelId::new(c.get())),
        };
        if event.is_same_channel() {
            return;
        }
        debug!(
            guild_id = %event.guild_id,
            member_id = %user_id,
            before = ?event.before,
            after = ?event.after,
            "voice state update"
        );

        let transitions = self
            .lifecycle(Self::platform(&ctx))
            .handle_voice_update(&event)
            .await;
        if !transitions.is_empty() {
            debug!(guild_id = %event.guild_id, count = transitions.len(), "lifecycle transitions applied");
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(guild_id) = msg.guild_id else {
            return;
        };
        if let Some(Command::SetupVoice { role }) = parse_command(&self.prefix, &msg.content) {
            self.run_setup(&ctx, &msg, GuildId::new(guild_id.get()), role)
                .await;
        }
    }
}

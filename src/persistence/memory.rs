//! In-process implementation of the persistence layer.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Store;
use super::models::{CreatedChannel, Setting};
use crate::domain::{ChannelId, GuildId};
use crate::error::BotError;

/// Row store kept in memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: RwLock<Vec<Setting>>,
    created: RwLock<Vec<CreatedChannel>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_setting(&self, setting: &Setting) -> Result<(), BotError> {
        self.settings.write().await.push(setting.clone());
        Ok(())
    }

    async fn search_settings(
        &self,
        guild_id: GuildId,
        name: &str,
    ) -> Result<Vec<Setting>, BotError> {
        Ok(self
            .settings
            .read()
            .await
            .iter()
            .filter(|s| s.guild_id == guild_id && s.setting == name)
            .cloned()
            .collect())
    }

    async fn list_settings(&self, guild_id: GuildId) -> Result<Vec<Setting>, BotError> {
        Ok(self
            .settings
            .read()
            .await
            .iter()
            .filter(|s| s.guild_id == guild_id)
            .cloned()
            .collect())
    }

    async fn insert_created_channel(&self, record: &CreatedChannel) -> Result<(), BotError> {
        self.created.write().await.push(record.clone());
        Ok(())
    }

    async fn search_created_channels(
        &self,
        guild_id: GuildId,
        voice_channel_id: ChannelId,
    ) -> Result<Vec<CreatedChannel>, BotError> {
        Ok(self
            .created
            .read()
            .await
            .iter()
            .filter(|r| r.guild_id == guild_id && r.voice_channel_id == voice_channel_id)
            .cloned()
            .collect())
    }

    async fn list_created_channels(
        &self,
        guild_id: GuildId,
    ) -> Result<Vec<CreatedChannel>, BotError> {
        Ok(self
            .created
            .read()
            .await
            .iter()
            .filter(|r| r.guild_id == guild_id)
            .cloned()
            .collect())
    }

    async fn delete_created_channel(
        &self,
        guild_id: GuildId,
        voice_channel_id: ChannelId,
    ) -> Result<u64, BotError> {
        let mut created = self.created.write().await;
        let before = created.len();
        created.retain(|r| !(r.guild_id == guild_id && r.voice_channel_id == voice_channel_id));
        Ok(u64::try_from(before - created.len()).unwrap_or(u64::MAX))
    }
}

//! Settings and registry lookups that decide which lifecycle branch applies.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::domain::{ChannelId, ChannelKind, GuildId, RoleId, SettingName};
use crate::error::BotError;
use crate::persistence::{CreatedChannel, Store};

/// Read-mostly view of one guild's settings and channel registry.
#[derive(Debug, Clone, Copy)]
pub struct EventCheck<'a> {
    store: &'a dyn Store,
    guild_id: GuildId,
}

impl<'a> EventCheck<'a> {
    /// Binds the lookups to `guild_id`.
    #[must_use]
    pub fn new(store: &'a dyn Store, guild_id: GuildId) -> Self {
        Self { store, guild_id }
    }

    /// Guild the lookups are scoped to.
    #[must_use]
    pub const fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Every registered trigger channel and the kind it creates.
    ///
    /// A channel registered under both a public and a private alias
    /// resolves to [`ChannelKind::Private`].
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn trigger_channels(&self) -> Result<HashMap<ChannelId, ChannelKind>, BotError> {
        let mut triggers = HashMap::new();
        for name in SettingName::TRIGGERS {
            let Some(kind) = name.trigger_kind() else {
                continue;
            };
            for row in self.store.search_settings(self.guild_id, name.as_str()).await? {
                let channel_id = ChannelId::new(row.value_id);
                match triggers.entry(channel_id) {
                    Entry::Vacant(slot) => {
                        slot.insert(kind);
                    }
                    Entry::Occupied(mut slot) if *slot.get() != kind => {
                        tracing::warn!(
                            guild_id = %self.guild_id,
                            %channel_id,
                            "trigger registered as both public and private; treating as private"
                        );
                        slot.insert(ChannelKind::Private);
                    }
                    Entry::Occupied(_) => {}
                }
            }
        }
        Ok(triggers)
    }

    /// Kind of pair to create when `channel_id` is joined, or `None` if it is
    /// not a trigger channel.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn is_activate(&self, channel_id: ChannelId) -> Result<Option<ChannelKind>, BotError> {
        Ok(self.trigger_channels().await?.get(&channel_id).copied())
    }

    /// Registry records whose voice channel is `channel_id`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn is_created_channel(
        &self,
        channel_id: ChannelId,
    ) -> Result<Vec<CreatedChannel>, BotError> {
        self.store
            .search_created_channels(self.guild_id, channel_id)
            .await
    }

    /// Number of trigger channels registered for `kind`, across both aliases.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn trigger_count(&self, kind: ChannelKind) -> Result<usize, BotError> {
        let mut count = 0;
        for alias in kind.trigger_aliases() {
            count += self
                .store
                .search_settings(self.guild_id, alias.as_str())
                .await?
                .len();
        }
        Ok(count)
    }

    /// Archive category, if configured.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn get_archive(&self) -> Result<Option<ChannelId>, BotError> {
        Ok(self.first_value(SettingName::Archive).await?.map(ChannelId::new))
    }

    /// Log channel, if configured.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn get_log(&self) -> Result<Option<ChannelId>, BotError> {
        Ok(self.first_value(SettingName::Log).await?.map(ChannelId::new))
    }

    /// Whether creators of public channels get rename rights. Off by default.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn get_edit_perms(&self) -> Result<bool, BotError> {
        Ok(self
            .first_value(SettingName::EditChannel)
            .await?
            .is_some_and(|v| v != 0))
    }

    /// Configured default role, if any.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn get_default_role(&self) -> Result<Option<RoleId>, BotError> {
        Ok(self.first_value(SettingName::DefaultRole).await?.map(RoleId::new))
    }

    /// Removes the registry record of voice channel `channel_id`.
    /// Removing an absent record is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn del_entry(&self, channel_id: ChannelId) -> Result<u64, BotError> {
        self.store
            .delete_created_channel(self.guild_id, channel_id)
            .await
    }

    /// Oldest row wins when a single-valued setting was stored twice.
    async fn first_value(&self, name: SettingName) -> Result<Option<u64>, BotError> {
        Ok(self
            .store
            .search_settings(self.guild_id, name.as_str())
            .await?
            .first()
            .map(|row| row.value_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, Setting};

    const GUILD: GuildId = GuildId::new(77);

    async fn seed(store: &MemoryStore, name: SettingName, value: u64) {
        let row = Setting::new(GUILD, name, "value_name", value, "test");
        assert!(store.insert_setting(&row).await.is_ok());
    }

    #[tokio::test]
    async fn triggers_map_aliases_to_kinds() {
        let store = MemoryStore::new();
        seed(&store, SettingName::PubChannel, 1).await;
        seed(&store, SettingName::Pub, 2).await;
        seed(&store, SettingName::PrivChannel, 3).await;
        seed(&store, SettingName::Priv, 4).await;
        seed(&store, SettingName::Log, 5).await;
        let check = EventCheck::new(&store, GUILD);

        for (id, expected) in [
            (1, Some(ChannelKind::Public)),
            (2, Some(ChannelKind::Public)),
            (3, Some(ChannelKind::Private)),
            (4, Some(ChannelKind::Private)),
            (5, None),
            (6, None),
        ] {
            let kind = check.is_activate(ChannelId::new(id)).await.ok().flatten();
            assert_eq!(kind, expected, "channel {id}");
        }
    }

    #[tokio::test]
    async fn alias_collision_prefers_private() {
        let store = MemoryStore::new();
        seed(&store, SettingName::Priv, 9).await;
        seed(&store, SettingName::Pub, 9).await;
        let check = EventCheck::new(&store, GUILD);

        let kind = check.is_activate(ChannelId::new(9)).await.ok().flatten();
        assert_eq!(kind, Some(ChannelKind::Private));
    }

    #[tokio::test]
    async fn triggers_are_scoped_to_guild() {
        let store = MemoryStore::new();
        seed(&store, SettingName::Pub, 1).await;
        let check = EventCheck::new(&store, GuildId::new(1));
        assert_eq!(check.is_activate(ChannelId::new(1)).await.ok().flatten(), None);
    }

    #[tokio::test]
    async fn single_value_lookups_default_when_absent() {
        let store = MemoryStore::new();
        let check = EventCheck::new(&store, GUILD);

        assert_eq!(check.get_archive().await.ok().flatten(), None);
        assert_eq!(check.get_log().await.ok().flatten(), None);
        assert_eq!(check.get_default_role().await.ok().flatten(), None);
        assert_eq!(check.get_edit_perms().await.ok(), Some(false));
    }

    #[tokio::test]
    async fn single_value_lookups_take_first_row() {
        let store = MemoryStore::new();
        seed(&store, SettingName::Archive, 30).await;
        seed(&store, SettingName::Archive, 31).await;
        seed(&store, SettingName::DefaultRole, 40).await;
        seed(&store, SettingName::EditChannel, 1).await;
        let check = EventCheck::new(&store, GUILD);

        assert_eq!(check.get_archive().await.ok().flatten(), Some(ChannelId::new(30)));
        assert_eq!(check.get_default_role().await.ok().flatten(), Some(RoleId::new(40)));
        assert_eq!(check.get_edit_perms().await.ok(), Some(true));
    }

    #[tokio::test]
    async fn del_entry_clears_registry_lookup() {
        let store = MemoryStore::new();
        let voice = ChannelId::new(500);
        let record = CreatedChannel::new(GUILD, ChannelKind::Public, voice, ChannelId::new(501), "t");
        assert!(store.insert_created_channel(&record).await.is_ok());
        let check = EventCheck::new(&store, GUILD);

        assert_eq!(check.is_created_channel(voice).await.unwrap_or_default(), vec![record]);
        assert_eq!(check.del_entry(voice).await.ok(), Some(1));
        assert!(check.is_created_channel(voice).await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn trigger_count_sums_both_aliases() {
        let store = MemoryStore::new();
        seed(&store, SettingName::PubChannel, 1).await;
        seed(&store, SettingName::Pub, 2).await;
        seed(&store, SettingName::Priv, 3).await;
        let check = EventCheck::new(&store, GUILD);

        assert_eq!(check.trigger_count(ChannelKind::Public).await.ok(), Some(2));
        assert_eq!(check.trigger_count(ChannelKind::Private).await.ok(), Some(1));
    }
}

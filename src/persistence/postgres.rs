//! PostgreSQL implementation of the persistence layer.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::Store;
use super::models::{CreatedChannel, Setting};
use crate::config::BotConfig;
use crate::domain::{ChannelId, ChannelKind, GuildId};
use crate::error::BotError;

type SettingRow = (i64, String, String, i64, DateTime<Utc>, String);
type CreatedChannelRow = (i64, String, i64, i64, DateTime<Utc>, String);

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`BotError::PersistenceError`] if the database cannot be
    /// reached.
    pub async fn connect(config: &BotConfig) -> Result<Self, BotError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies pending migrations from `migrations/`.
    ///
    /// # Errors
    ///
    /// Returns a [`BotError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), BotError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BotError::PersistenceError(e.to_string()))
    }
}

/// Snowflakes are stored bit-for-bit in signed `BIGINT` columns.
#[allow(clippy::cast_possible_wrap)]
const fn to_db(id: u64) -> i64 {
    id as i64
}

#[allow(clippy::cast_sign_loss)]
const fn from_db(id: i64) -> u64 {
    id as u64
}

fn setting_from_row(
    guild_id: GuildId,
    (_, setting, value_name, value_id, created_at, version): SettingRow,
) -> Setting {
    Setting {
        guild_id,
        setting,
        value_name,
        value_id: from_db(value_id),
        created_at,
        version,
    }
}

fn created_from_row(
    guild_id: GuildId,
    (_, channel_type, channel_id, linked_channel, created_at, version): CreatedChannelRow,
) -> Result<CreatedChannel, BotError> {
    let kind = channel_type
        .parse::<ChannelKind>()
        .map_err(|e| BotError::PersistenceError(e.to_string()))?;
    Ok(CreatedChannel {
        guild_id,
        kind,
        voice_channel_id: ChannelId::new(from_db(channel_id)),
        text_channel_id: ChannelId::new(from_db(linked_channel)),
        created_at,
        version,
    })
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_setting(&self, setting: &Setting) -> Result<(), BotError> {
        sqlx::query(
            "INSERT INTO setting (guild_id, setting, value_name, value_id, created_at, version) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(to_db(setting.guild_id.get()))
        .bind(&setting.setting)
        .bind(&setting.value_name)
        .bind(to_db(setting.value_id))
        .bind(setting.created_at)
        .bind(&setting.version)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn search_settings(
        &self,
        guild_id: GuildId,
        name: &str,
    ) -> Result<Vec<Setting>, BotError> {
        let rows = sqlx::query_as::<_, SettingRow>(
            "SELECT id, setting, value_name, value_id, created_at, version FROM setting \
             WHERE guild_id = $1 AND setting = $2 ORDER BY id ASC",
        )
        .bind(to_db(guild_id.get()))
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| setting_from_row(guild_id, row))
            .collect())
    }

    async fn list_settings(&self, guild_id: GuildId) -> Result<Vec<Setting>, BotError> {
        let rows = sqlx::query_as::<_, SettingRow>(
            "SELECT id, setting, value_name, value_id, created_at, version FROM setting \
             WHERE guild_id = $1 ORDER BY id ASC",
        )
        .bind(to_db(guild_id.get()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| setting_from_row(guild_id, row))
            .collect())
    }

    async fn insert_created_channel(&self, record: &CreatedChannel) -> Result<(), BotError> {
        sqlx::query(
            "INSERT INTO created_channels \
             (guild_id, channel_type, channel_id, linked_channel, created_at, version) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(to_db(record.guild_id.get()))
        .bind(record.kind.as_str())
        .bind(to_db(record.voice_channel_id.get()))
        .bind(to_db(record.text_channel_id.get()))
        .bind(record.created_at)
        .bind(&record.version)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn search_created_channels(
        &self,
        guild_id: GuildId,
        voice_channel_id: ChannelId,
    ) -> Result<Vec<CreatedChannel>, BotError> {
        let rows = sqlx::query_as::<_, CreatedChannelRow>(
            "SELECT id, channel_type, channel_id, linked_channel, created_at, version \
             FROM created_channels WHERE guild_id = $1 AND channel_id = $2 ORDER BY id ASC",
        )
        .bind(to_db(guild_id.get()))
        .bind(to_db(voice_channel_id.get()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| created_from_row(guild_id, row))
            .collect()
    }

    async fn list_created_channels(
        &self,
        guild_id: GuildId,
    ) -> Result<Vec<CreatedChannel>, BotError> {
        let rows = sqlx::query_as::<_, CreatedChannelRow>(
            "SELECT id, channel_type, channel_id, linked_channel, created_at, version \
             FROM created_channels WHERE guild_id = $1 ORDER BY id ASC",
        )
        .bind(to_db(guild_id.get()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| created_from_row(guild_id, row))
            .collect()
    }

    async fn delete_created_channel(
        &self,
        guild_id: GuildId,
        voice_channel_id: ChannelId,
    ) -> Result<u64, BotError> {
        let result =
            sqlx::query("DELETE FROM created_channels WHERE guild_id = $1 AND channel_id = $2")
                .bind(to_db(guild_id.get()))
                .bind(to_db(voice_channel_id.get()))
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}

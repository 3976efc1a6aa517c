//! Persistence layer: guild settings and the created-channel registry.
//!
//! [`Store`] is the injected persistence client. Every call takes the guild
//! id as a parameter; nothing is bound to a global handle. Two
//! implementations exist: [`postgres::PostgresStore`] backed by
//! `sqlx::PgPool`, and [`memory::MemoryStore`] used when persistence is
//! disabled and in tests.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::{ChannelId, GuildId};
use crate::error::BotError;

pub use memory::MemoryStore;
pub use models::{CreatedChannel, Setting};
pub use postgres::PostgresStore;

/// Row store for the `setting` and `created_channels` tables.
///
/// Search results are returned in insertion order, so "first matching row"
/// is the oldest one.
#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Appends a settings row.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::PersistenceError`] on storage failure.
    async fn insert_setting(&self, setting: &Setting) -> Result<(), BotError>;

    /// Settings rows of `guild_id` whose name equals `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::PersistenceError`] on storage failure.
    async fn search_settings(&self, guild_id: GuildId, name: &str)
    -> Result<Vec<Setting>, BotError>;

    /// All settings rows of `guild_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::PersistenceError`] on storage failure.
    async fn list_settings(&self, guild_id: GuildId) -> Result<Vec<Setting>, BotError>;

    /// Appends a created-channel record.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::PersistenceError`] on storage failure.
    async fn insert_created_channel(&self, record: &CreatedChannel) -> Result<(), BotError>;

    /// Records of `guild_id` whose voice channel is `voice_channel_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::PersistenceError`] on storage failure.
    async fn search_created_channels(
        &self,
        guild_id: GuildId,
        voice_channel_id: ChannelId,
    ) -> Result<Vec<CreatedChannel>, BotError>;

    /// All created-channel records of `guild_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::PersistenceError`] on storage failure.
    async fn list_created_channels(&self, guild_id: GuildId)
    -> Result<Vec<CreatedChannel>, BotError>;

    /// Deletes the records of `voice_channel_id`, returning how many went.
    /// Deleting an absent record is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::PersistenceError`] on storage failure.
    async fn delete_created_channel(
        &self,
        guild_id: GuildId,
        voice_channel_id: ChannelId,
    ) -> Result<u64, BotError>;
}

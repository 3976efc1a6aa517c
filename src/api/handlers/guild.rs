//! Read-only guild handlers: stored settings and live managed pairs.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ChannelsResponse, CreatedChannelDto, SettingDto, SettingsResponse};
use crate::app_state::AppState;
use crate::domain::GuildId;
use crate::error::{BotError, ErrorResponse};

fn parse_guild_id(raw: &str) -> Result<GuildId, BotError> {
    raw.parse()
        .map_err(|_| BotError::InvalidRequest(format!("guild id must be numeric, got '{raw}'")))
}

/// `GET /guilds/{guild_id}/settings`: Stored settings of a guild.
///
/// # Errors
///
/// Returns [`BotError`] on a malformed id or a store failure.
#[utoipa::path(
    get,
    path = "/api/v1/guilds/{guild_id}/settings",
    tag = "Guilds",
    summary = "List guild settings",
    description = "Returns every stored setting row of the guild, including trigger channels, archive and log targets.",
    params(("guild_id" = String, Path, description = "Guild snowflake")),
    responses(
        (status = 200, description = "Settings of the guild", body = SettingsResponse),
        (status = 400, description = "Malformed guild id", body = ErrorResponse),
    )
)]
pub async fn list_settings(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
) -> Result<impl IntoResponse, BotError> {
    let guild_id = parse_guild_id(&guild_id)?;
    let rows = state.store.list_settings(guild_id).await?;

    Ok(Json(SettingsResponse {
        guild_id: guild_id.to_string(),
        data: rows.into_iter().map(SettingDto::from).collect(),
    }))
}

/// `GET /guilds/{guild_id}/channels`: Live managed channel pairs.
///
/// # Errors
///
/// Returns [`BotError`] on a malformed id or a store failure.
#[utoipa::path(
    get,
    path = "/api/v1/guilds/{guild_id}/channels",
    tag = "Guilds",
    summary = "List managed channel pairs",
    description = "Returns the registry of voice and text channel pairs currently managed in the guild.",
    params(("guild_id" = String, Path, description = "Guild snowflake")),
    responses(
        (status = 200, description = "Managed pairs", body = ChannelsResponse),
        (status = 400, description = "Malformed guild id", body = ErrorResponse),
    )
)]
pub async fn list_channels(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
) -> Result<impl IntoResponse, BotError> {
    let guild_id = parse_guild_id(&guild_id)?;
    let data: Vec<CreatedChannelDto> = state
        .store
        .list_created_channels(guild_id)
        .await?
        .into_iter()
        .map(CreatedChannelDto::from)
        .collect();

    Ok(Json(ChannelsResponse {
        guild_id: guild_id.to_string(),
        total: data.len(),
        data,
    }))
}

/// Guild routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/guilds/{guild_id}/settings", get(list_settings))
        .route("/guilds/{guild_id}/channels", get(list_channels))
}

//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered lifecycle events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::api::dto::CreatedChannelDto;
use crate::domain::{GuildId, LifecycleEvent};
use crate::persistence::Store;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<LifecycleEvent>,
    store: Arc<dyn Store>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, store.as_ref()).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if subs.matches(event.guild_id()) {
                            let msg = WsMessage::new(
                                uuid::Uuid::new_v4().to_string(),
                                WsMessageType::Event,
                                serde_json::to_value(&event).unwrap_or_default(),
                            );
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Splits raw ids into parsed guilds and the wildcard flag. Unparseable
/// ids are skipped.
fn parse_guild_ids(raw: &[String]) -> (Vec<GuildId>, bool) {
    let mut ids = Vec::new();
    let mut wildcard = false;
    for id in raw {
        if id == "*" {
            wildcard = true;
        } else if let Ok(guild) = id.parse::<GuildId>() {
            ids.push(guild);
        }
    }
    (ids, wildcard)
}

fn id_strings(ids: &[GuildId]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

/// Handles a text message from the client, returning an optional JSON response.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    store: &dyn Store,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error("", 400, "malformed JSON")).ok();
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return serde_json::to_string(&WsMessage::error(msg.id, 404, "unknown command")).ok();
    };

    let response = match command {
        WsCommand::Subscribe { guild_ids } => {
            let (ids, wildcard) = parse_guild_ids(&guild_ids);
            subs.subscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": id_strings(&ids),
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { guild_ids } => {
            let (ids, wildcard) = parse_guild_ids(&guild_ids);
            subs.unsubscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": id_strings(&ids),
                    "remaining_count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::ListChannels { guild_id } => {
            let Ok(guild) = guild_id.parse::<GuildId>() else {
                return serde_json::to_string(&WsMessage::error(msg.id, 400, "invalid guild id"))
                    .ok();
            };
            match store.list_created_channels(guild).await {
                Ok(rows) => {
                    let data: Vec<CreatedChannelDto> =
                        rows.into_iter().map(CreatedChannelDto::from).collect();
                    WsMessage::new(
                        msg.id,
                        WsMessageType::Response,
                        serde_json::json!({ "guild_id": guild_id, "data": data }),
                    )
                }
                Err(e) => {
                    tracing::warn!(%guild, error = %e, "ws channel listing failed");
                    WsMessage::error(msg.id, 500, "channel registry unavailable")
                }
            }
        }
    };
    serde_json::to_string(&response).ok()
}

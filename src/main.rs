//! voice-forge entry point.
//!
//! Starts the operator HTTP server and the Discord gateway client.

use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use axum::routing::get;
use serenity::Client;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use voice_forge::api;
use voice_forge::app_state::AppState;
use voice_forge::config::BotConfig;
use voice_forge::discord::VoiceHandler;
use voice_forge::domain::EventBus;
use voice_forge::persistence::{MemoryStore, PostgresStore, Store};
use voice_forge::ws::handler::ws_handler;

async fn build_store(config: &BotConfig) -> anyhow::Result<Arc<dyn Store>> {
    if !config.persistence_enabled {
        tracing::warn!("persistence disabled, settings live in memory only");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = PostgresStore::connect(config)
        .await
        .context("connecting to PostgreSQL")?;
    store.migrate().await.context("running migrations")?;
    tracing::info!("database ready");
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = BotConfig::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::info!(?config, "starting voice-forge");

    let store = build_store(&config).await?;
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Operator surface
    let app_state = AppState {
        store: Arc::clone(&store),
        event_bus: event_bus.clone(),
    };
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    // Gateway client
    let handler = VoiceHandler::new(store, event_bus, &config);
    let mut client = Client::builder(&config.discord_token, VoiceHandler::intents())
        .event_handler(handler)
        .await
        .context("building discord client")?;

    tokio::select! {
        result = client.start() => result.context("discord client stopped")?,
        result = server => result.context("http server task panicked")??,
    }

    Ok(())
}

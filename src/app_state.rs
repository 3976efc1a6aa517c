//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::persistence::Store;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Settings and channel registry.
    pub store: Arc<dyn Store>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

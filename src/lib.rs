//! # voice-forge
//!
//! Discord bot service that hands out temporary voice channels.
//!
//! Joining a registered trigger channel creates a voice channel plus a
//! linked text channel only the voice members can see, and moves the member
//! in. When the last member leaves, the text channel is archived (if it has
//! history and an archive category is configured) or deleted, and the voice
//! channel goes with it.
//!
//! ## Architecture
//!
//! ```text
//! Discord gateway (serenity)          Operators (HTTP, WebSocket)
//!     │                                   │
//!     ├── VoiceHandler (discord/)         ├── REST Handlers (api/)
//!     │                                   ├── WS Handler (ws/)
//!     ├── LifecycleService (service/)     │
//!     ├── SetupService (service/)         │
//!     │                                   │
//!     ├── ChatPlatform (platform/) ───────┤
//!     ├── EventBus (domain/) ─────────────┘
//!     │
//!     └── Store: PostgreSQL or in-memory (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod discord;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod service;
pub mod ws;

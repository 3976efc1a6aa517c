//! Serenity adapter: gateway handler and [`crate::platform::ChatPlatform`]
//! implementation.

pub mod handler;
pub mod platform;

pub use handler::VoiceHandler;
pub use platform::DiscordPlatform;

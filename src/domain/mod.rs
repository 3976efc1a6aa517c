//! Domain layer: identifiers, permission model, events and per-guild locking.
//!
//! Everything here is platform-agnostic. The serenity adapter in
//! [`crate::discord`] converts to and from these types at the boundary.

pub mod channel_kind;
pub mod event_bus;
pub mod guild_locks;
pub mod ids;
pub mod lifecycle_event;
pub mod names;
pub mod permissions;
pub mod setting;
pub mod voice_event;

pub use channel_kind::ChannelKind;
pub use event_bus::EventBus;
pub use guild_locks::GuildLocks;
pub use ids::{ChannelId, GuildId, RoleId, UserId};
pub use lifecycle_event::{LifecycleEvent, TextDisposition};
pub use names::ChannelNames;
pub use permissions::{OverwriteTarget, Overwrites, PermissionOverwrite};
pub use setting::SettingName;
pub use voice_event::{MemberRef, VoiceStateUpdate};

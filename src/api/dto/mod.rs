//! Data Transfer Objects for REST response serialization.
//!
//! Snowflake ids are serialized as JSON strings to prevent precision loss
//! in JavaScript clients.

pub mod guild_dto;

pub use guild_dto::*;

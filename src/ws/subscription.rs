//! Per-connection subscription manager.
//!
//! Tracks which guilds a WebSocket client follows and filters lifecycle
//! events server-side.

use std::collections::HashSet;

use crate::domain::GuildId;

/// Manages the set of guild subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed guilds. Ignored while `subscribe_all` is set.
    guild_ids: HashSet<GuildId>,
    /// Whether the client follows every guild (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds guilds to the subscription set.
    pub fn subscribe(&mut self, ids: &[GuildId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.guild_ids.extend(ids.iter().copied());
    }

    /// Removes guilds from the subscription set. `wildcard` clears the
    /// wildcard flag.
    pub fn unsubscribe(&mut self, ids: &[GuildId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.guild_ids.remove(id);
        }
    }

    /// Returns `true` if events of `guild_id` should be forwarded.
    #[must_use]
    pub fn matches(&self, guild_id: GuildId) -> bool {
        self.subscribe_all || self.guild_ids.contains(&guild_id)
    }

    /// Returns the number of explicitly subscribed guilds.
    #[must_use]
    pub fn count(&self) -> usize {
        self.guild_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

//! Per-guild serialization of lifecycle work.
//!
//! The gateway dispatches events concurrently. Two events for the same guild
//! (a rapid join then leave) would otherwise interleave their registry reads
//! and writes and could tear a pair down twice. [`GuildLocks`] hands out one
//! async mutex per guild; different guilds proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::GuildId;

/// Map of guild id to its lifecycle mutex.
#[derive(Debug, Default)]
pub struct GuildLocks {
    locks: Mutex<HashMap<GuildId, Arc<Mutex<()>>>>,
}

impl GuildLocks {
    /// Creates an empty lock map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `guild_id`.
    ///
    /// The returned guard releases the guild when dropped.
    pub async fn acquire(&self, guild_id: GuildId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock().await;
            Arc::clone(map.entry(guild_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of guilds seen so far.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Returns `true` if no guild has been locked yet.
    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_guild_is_serialized() {
        let locks = Arc::new(GuildLocks::new());
        let guard = locks.acquire(GuildId::new(1)).await;

        let contender = Arc::clone(&locks);
        let waiter = tokio::spawn(async move {
            let _guard = contender.acquire(GuildId::new(1)).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        let joined = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn different_guilds_do_not_block() {
        let locks = GuildLocks::new();
        let _a = locks.acquire(GuildId::new(1)).await;
        let acquired =
            tokio::time::timeout(Duration::from_millis(200), locks.acquire(GuildId::new(2))).await;
        assert!(acquired.is_ok());
        assert_eq!(locks.len().await, 2);
        assert!(!locks.is_empty().await);
    }
}

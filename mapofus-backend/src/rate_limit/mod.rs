//! Per-identifier cooldown for the auth routes.
//!
//! Each route owns a [`CooldownLimiter`] with its own scope; limiters share a
//! [`CooldownStore`], which is either process-local ([`MemoryCooldownStore`])
//! or a SQLite file several instances can point at ([`SqliteCooldownStore`]).

mod memory_store;
mod sqlite_store;

pub use memory_store::MemoryCooldownStore;
pub use sqlite_store::SqliteCooldownStore;

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use crate::config::CooldownStoreKind;

/// Minimum interval between two auth attempts for one identifier.
pub const DEFAULT_COOLDOWN_MS: i64 = 30_000;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownDecision {
    Allowed,
    Blocked { remaining: Duration },
}

/// Storage for last-attempt timestamps.
pub trait CooldownStore: Send + Sync {
    /// If `key` was recorded less than `window` before `now`, report it as
    /// blocked and leave the entry untouched. Otherwise record `now` for the
    /// key and allow. The check and the write happen atomically per key.
    fn check_and_record(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<CooldownDecision, String>;

    /// Drop entries recorded at or before `cutoff`. Returns how many went.
    fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, String>;
}

pub fn open_store(kind: &CooldownStoreKind) -> Result<Arc<dyn CooldownStore>, String> {
    match kind {
        CooldownStoreKind::Memory => Ok(Arc::new(MemoryCooldownStore::new())),
        CooldownStoreKind::Sqlite(path) => Ok(Arc::new(SqliteCooldownStore::open(path)?)),
    }
}

#[derive(Clone)]
pub struct CooldownLimiter {
    scope: &'static str,
    store: Arc<dyn CooldownStore>,
    clock: Arc<dyn Clock>,
    window: Duration,
}

impl CooldownLimiter {
    pub fn new(
        scope: &'static str,
        store: Arc<dyn CooldownStore>,
        clock: Arc<dyn Clock>,
        window_ms: i64,
    ) -> Self {
        Self {
            scope,
            store,
            clock,
            window: Duration::milliseconds(window_ms),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Identifiers are used as given: no trimming or case folding.
    pub fn check(&self, identifier: &str) -> Result<CooldownDecision, String> {
        let key = format!("{}:{}", self.scope, identifier);
        let decision = self
            .store
            .check_and_record(&key, self.clock.now(), self.window)?;

        if let CooldownDecision::Blocked { remaining } = decision {
            log::warn!(
                "[COOLDOWN] {} attempt for {} rejected ({}ms remaining)",
                self.scope,
                identifier,
                remaining.num_milliseconds()
            );
        }

        Ok(decision)
    }
}

/// Periodically evict entries that can no longer block anyone.
pub fn spawn_sweeper(
    store: Arc<dyn CooldownStore>,
    clock: Arc<dyn Clock>,
    window: Duration,
    every: StdDuration,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.purge_older_than(clock.now() - window) {
                Ok(0) => {}
                Ok(n) => log::debug!("[COOLDOWN] Evicted {} expired entries", n),
                Err(e) => log::error!("[COOLDOWN] Sweep failed: {}", e),
            }
        }
    });
}

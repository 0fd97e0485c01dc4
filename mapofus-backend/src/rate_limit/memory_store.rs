use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{CooldownDecision, CooldownStore};

/// Process-local cooldown map. The entry API holds the shard lock across the
/// check and the write, so concurrent actix workers cannot both pass.
#[derive(Default)]
pub struct MemoryCooldownStore {
    entries: DashMap<String, DateTime<Utc>>,
}

impl MemoryCooldownStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl CooldownStore for MemoryCooldownStore {
    fn check_and_record(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<CooldownDecision, String> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let elapsed = now - *entry.get();
                if elapsed < window {
                    return Ok(CooldownDecision::Blocked {
                        remaining: window - elapsed,
                    });
                }
                entry.insert(now);
                Ok(CooldownDecision::Allowed)
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                Ok(CooldownDecision::Allowed)
            }
        }
    }

    fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, String> {
        let before = self.entries.len();
        self.entries.retain(|_, last| *last > cutoff);
        Ok(before.saturating_sub(self.entries.len()))
    }
}

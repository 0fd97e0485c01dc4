use chrono::{DateTime, Duration, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, TransactionBehavior};
use std::path::Path;

use super::{CooldownDecision, CooldownStore};

/// Cooldown entries in a SQLite file, for deployments that run several
/// backend instances against the same volume.
pub struct SqliteCooldownStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteCooldownStore {
    pub fn open(path: &str) -> Result<Self, String> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
            }
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch("PRAGMA busy_timeout = 5000;"));
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| format!("Failed to open cooldown database {}: {}", path, e))?;

        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             CREATE TABLE IF NOT EXISTS auth_cooldowns (
                 key TEXT PRIMARY KEY,
                 last_attempt_ms INTEGER NOT NULL
             );",
        )
        .map_err(|e| format!("Failed to initialize cooldown table: {}", e))?;

        log::info!("[COOLDOWN] Using SQLite cooldown store at {}", path);
        Ok(Self { pool })
    }
}

impl CooldownStore for SqliteCooldownStore {
    fn check_and_record(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<CooldownDecision, String> {
        let mut conn = self.pool.get().map_err(|e| e.to_string())?;
        // IMMEDIATE takes the write lock up front so two instances cannot
        // both read "no entry" for the same key.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| e.to_string())?;

        let now_ms = now.timestamp_millis();
        let last_ms: Option<i64> = tx
            .query_row(
                "SELECT last_attempt_ms FROM auth_cooldowns WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| e.to_string())?;

        if let Some(last_ms) = last_ms {
            let elapsed_ms = now_ms - last_ms;
            if elapsed_ms < window.num_milliseconds() {
                return Ok(CooldownDecision::Blocked {
                    remaining: Duration::milliseconds(window.num_milliseconds() - elapsed_ms),
                });
            }
        }

        tx.execute(
            "INSERT INTO auth_cooldowns (key, last_attempt_ms) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET last_attempt_ms = excluded.last_attempt_ms",
            rusqlite::params![key, now_ms],
        )
        .map_err(|e| e.to_string())?;
        tx.commit().map_err(|e| e.to_string())?;

        Ok(CooldownDecision::Allowed)
    }

    fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM auth_cooldowns WHERE last_attempt_ms <= ?1",
            [cutoff.timestamp_millis()],
        )
        .map_err(|e| e.to_string())
    }
}

use std::env;

use crate::rate_limit::DEFAULT_COOLDOWN_MS;

const DEFAULT_SWEEP_SECS: u64 = 300;

/// Where cooldown entries live.
#[derive(Clone, Debug, PartialEq)]
pub enum CooldownStoreKind {
    /// Process-local map; fine for a single instance.
    Memory,
    /// SQLite file shared by every instance that points at it.
    Sqlite(String),
}

impl CooldownStoreKind {
    pub fn name(&self) -> &'static str {
        match self {
            CooldownStoreKind::Memory => "memory",
            CooldownStoreKind::Sqlite(_) => "sqlite",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// Public origin of the app, used for redirects and confirmation links.
    pub base_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub cooldown_ms: i64,
    pub cooldown_store: CooldownStoreKind,
    pub cooldown_sweep_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let supabase_url = lookup("SUPABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| "SUPABASE_URL must be set".to_string())?;
        let supabase_anon_key = lookup("SUPABASE_ANON_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| "SUPABASE_ANON_KEY must be set".to_string())?;

        let port = match lookup("PORT") {
            Some(v) => v
                .parse()
                .map_err(|_| format!("PORT must be a valid number, got '{}'", v))?,
            None => 3000,
        };

        let base_url = lookup("BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let cooldown_ms = match lookup("AUTH_COOLDOWN_MS") {
            Some(v) => v
                .parse::<i64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| format!("AUTH_COOLDOWN_MS must be a positive number, got '{}'", v))?,
            None => DEFAULT_COOLDOWN_MS,
        };

        let cooldown_store = match lookup("COOLDOWN_STORE").as_deref() {
            None | Some("memory") => CooldownStoreKind::Memory,
            Some("sqlite") => CooldownStoreKind::Sqlite(
                lookup("COOLDOWN_DB_PATH").unwrap_or_else(|| "./.db/cooldowns.db".to_string()),
            ),
            Some(other) => {
                return Err(format!(
                    "COOLDOWN_STORE must be 'memory' or 'sqlite', got '{}'",
                    other
                ));
            }
        };

        let cooldown_sweep_secs = match lookup("COOLDOWN_SWEEP_SECS") {
            Some(v) => v.parse::<u64>().ok().filter(|secs| *secs > 0).ok_or_else(|| {
                format!("COOLDOWN_SWEEP_SECS must be a positive number, got '{}'", v)
            })?,
            None => DEFAULT_SWEEP_SECS,
        };

        Ok(Self {
            port,
            base_url,
            supabase_url,
            supabase_anon_key,
            cooldown_ms,
            cooldown_store,
            cooldown_sweep_secs,
        })
    }

    /// Link target embedded in confirmation emails.
    pub fn email_redirect_url(&self) -> String {
        format!("{}/auth/callback", self.base_url)
    }

    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

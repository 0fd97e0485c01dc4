//! Fakes shared by the route and limiter tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use mapofus_types::{AuthUser, Session};
use parking_lot::Mutex;
use std::sync::Arc;
use supabase_client::{AuthApi, SupabaseError};

use crate::AppState;
use crate::config::{Config, CooldownStoreKind};
use crate::rate_limit::{CooldownLimiter, MemoryCooldownStore};

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()),
        }
    }

    pub fn advance_ms(&self, ms: i64) {
        *self.now.lock() += Duration::milliseconds(ms);
    }
}

impl crate::rate_limit::Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

pub fn session_for(email: &str) -> Session {
    Session {
        access_token: format!("access-{}", email),
        refresh_token: format!("refresh-{}", email),
        expires_at: None,
        user: AuthUser {
            id: "user-1".to_string(),
            email: Some(email.to_string()),
        },
    }
}

/// Records every collaborator call; failures are scripted per operation.
#[derive(Default)]
pub struct MockAuthApi {
    pub calls: Mutex<Vec<String>>,
    pub sign_in_error: Mutex<Option<(u16, String)>>,
    pub sign_up_error: Mutex<Option<(u16, String)>>,
    pub exchange_error: Mutex<Option<(u16, String)>>,
    pub get_user_error: Mutex<Option<(u16, String)>>,
}

impl MockAuthApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn scripted(slot: &Mutex<Option<(u16, String)>>) -> Result<(), SupabaseError> {
        match slot.lock().clone() {
            Some((status, body)) => Err(SupabaseError::from_response(status, &body)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn sign_in_with_password(
        &self,
        email: &str,
        _password: &str,
    ) -> Result<Session, SupabaseError> {
        self.record(format!("sign_in:{}", email));
        Self::scripted(&self.sign_in_error)?;
        Ok(session_for(email))
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        email_redirect_to: Option<&str>,
    ) -> Result<(), SupabaseError> {
        self.record(format!("sign_up:{}:{}", email, email_redirect_to.unwrap_or("")));
        Self::scripted(&self.sign_up_error)
    }

    async fn resend_signup(
        &self,
        email: &str,
        _email_redirect_to: Option<&str>,
    ) -> Result<(), SupabaseError> {
        self.record(format!("resend:{}", email));
        Ok(())
    }

    async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<Session, SupabaseError> {
        self.record(format!("exchange:{}:{}", auth_code, code_verifier));
        Self::scripted(&self.exchange_error)?;
        Ok(session_for("oauth@example.com"))
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        self.record(format!("get_user:{}", access_token));
        Self::scripted(&self.get_user_error)?;
        Ok(session_for("oauth@example.com").user)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        self.record(format!("sign_out:{}", access_token));
        Ok(())
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> String {
        format!(
            "https://auth.test/authorize?provider={}&redirect_to={}&code_challenge={}",
            provider,
            urlencoding::encode(redirect_to),
            code_challenge
        )
    }
}

pub fn test_config() -> Config {
    Config {
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        supabase_url: "https://abc.supabase.co".to_string(),
        supabase_anon_key: "anon".to_string(),
        cooldown_ms: 30_000,
        cooldown_store: CooldownStoreKind::Memory,
        cooldown_sweep_secs: 300,
    }
}

pub fn test_state(auth: Arc<MockAuthApi>, clock: Arc<ManualClock>) -> AppState {
    let config = test_config();
    let store = Arc::new(MemoryCooldownStore::new());
    AppState {
        login_limiter: CooldownLimiter::new("login", store.clone(), clock.clone(), config.cooldown_ms),
        register_limiter: CooldownLimiter::new("register", store, clock, config.cooldown_ms),
        auth,
        config,
    }
}

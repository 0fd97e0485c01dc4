//! Sign-in / registration form.

use mapofus_types::CredentialsRequest;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::auth_routes::AuthRoutes;
use crate::session::AuthClient;
use crate::surface::{Navigator, ROOT_PATH};

/// Seconds the submit button stays disabled after a successful attempt.
pub const SUBMIT_COOLDOWN_SECS: u32 = 30;

const LOGIN_SUCCESS_MESSAGE: &str = "Login successful, redirecting to map!";
const REGISTER_SUCCESS_FALLBACK: &str = "Check your email to confirm your account.";
const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords do not match";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    Register,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStatus {
    None,
    Info(String),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct AuthFormState {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub loading: bool,
    pub status: FormStatus,
    pub cooldown_secs: u32,
}

impl Default for AuthFormState {
    fn default() -> Self {
        Self {
            mode: AuthMode::SignIn,
            email: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            loading: false,
            status: FormStatus::None,
            cooldown_secs: 0,
        }
    }
}

/// Path that starts the OAuth flow on the backend.
pub fn oauth_path(provider: &str) -> String {
    format!("/auth/oauth?provider={}", urlencoding::encode(provider))
}

pub struct AuthFormController {
    routes: Arc<dyn AuthRoutes>,
    navigator: Arc<dyn Navigator>,
    auth_client: Option<Arc<AuthClient>>,
    state: Arc<Mutex<AuthFormState>>,
    countdown: Mutex<Option<CancellationToken>>,
}

impl AuthFormController {
    pub fn new(routes: Arc<dyn AuthRoutes>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            routes,
            navigator,
            auth_client: None,
            state: Arc::new(Mutex::new(AuthFormState::default())),
            countdown: Mutex::new(None),
        }
    }

    /// Publish sessions from successful logins to this client.
    pub fn with_auth_client(mut self, auth_client: Arc<AuthClient>) -> Self {
        self.auth_client = Some(auth_client);
        self
    }

    pub fn state(&self) -> AuthFormState {
        self.state.lock().clone()
    }

    pub fn set_email(&self, email: &str) {
        self.state.lock().email = email.to_string();
    }

    pub fn set_password(&self, password: &str) {
        self.state.lock().password = password.to_string();
    }

    pub fn set_confirm_password(&self, confirm: &str) {
        self.state.lock().confirm_password = confirm.to_string();
    }

    /// Switch between sign-in and registration, clearing any status line.
    pub fn toggle_mode(&self) {
        let mut state = self.state.lock();
        state.mode = match state.mode {
            AuthMode::SignIn => AuthMode::Register,
            AuthMode::Register => AuthMode::SignIn,
        };
        state.status = FormStatus::None;
        state.confirm_password.clear();
    }

    pub fn can_submit(&self) -> bool {
        let state = self.state.lock();
        !state.loading && state.cooldown_secs == 0
    }

    pub fn submit_label(&self) -> String {
        let state = self.state.lock();
        if state.loading {
            return "Processing...".to_string();
        }
        if state.cooldown_secs > 0 {
            let action = match state.mode {
                AuthMode::SignIn => "logging in",
                AuthMode::Register => "registering",
            };
            return format!(
                "Please wait {} seconds before {}",
                state.cooldown_secs, action
            );
        }
        match state.mode {
            AuthMode::SignIn => "Sign In".to_string(),
            AuthMode::Register => "Sign Up".to_string(),
        }
    }

    pub async fn submit(&self) {
        let (mode, credentials) = {
            let mut state = self.state.lock();
            if state.loading || state.cooldown_secs > 0 {
                return;
            }
            if state.mode == AuthMode::Register && state.password != state.confirm_password {
                state.status = FormStatus::Error(PASSWORD_MISMATCH_MESSAGE.to_string());
                return;
            }
            state.loading = true;
            state.status = FormStatus::None;
            (
                state.mode,
                CredentialsRequest {
                    email: state.email.clone(),
                    password: state.password.clone(),
                },
            )
        };

        let result = match mode {
            AuthMode::SignIn => self.routes.login(&credentials).await,
            AuthMode::Register => self.routes.register(&credentials).await,
        };

        let (status, succeeded) = match result {
            Ok(response) if response.is_success() => {
                if mode == AuthMode::SignIn {
                    self.finish_login(response.tokens).await;
                    (FormStatus::Info(LOGIN_SUCCESS_MESSAGE.to_string()), true)
                } else {
                    let message = response
                        .body
                        .message
                        .unwrap_or_else(|| REGISTER_SUCCESS_FALLBACK.to_string());
                    (FormStatus::Info(message), true)
                }
            }
            Ok(response) => {
                let reason = response
                    .body
                    .error
                    .unwrap_or_else(|| format!("HTTP {}", response.status));
                let prefix = match mode {
                    AuthMode::SignIn => "Login failed",
                    AuthMode::Register => "Registration failed",
                };
                (FormStatus::Error(format!("{}: {}", prefix, reason)), false)
            }
            Err(e) => {
                log::error!("[AUTH_FORM] Request failed: {}", e);
                (
                    FormStatus::Error(format!("Authentication failed: {}", e)),
                    false,
                )
            }
        };

        {
            let mut state = self.state.lock();
            state.loading = false;
            state.status = status;
        }
        if succeeded {
            self.start_cooldown(SUBMIT_COOLDOWN_SECS);
        }
    }

    async fn finish_login(&self, tokens: Option<mapofus_types::SessionTokens>) {
        if let (Some(client), Some(tokens)) = (&self.auth_client, tokens) {
            if let Err(e) = client.adopt_tokens(tokens).await {
                log::warn!("[AUTH_FORM] Could not load signed-in user: {}", e);
            }
        }
        self.navigator.push(ROOT_PATH);
    }

    pub fn oauth_sign_in(&self, provider: &str) {
        self.navigator.reload(&oauth_path(provider));
    }

    fn start_cooldown(&self, secs: u32) {
        let token = CancellationToken::new();
        if let Some(previous) = self.countdown.lock().replace(token.clone()) {
            previous.cancel();
        }
        self.state.lock().cooldown_secs = secs;

        let state = self.state.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = ticker.tick() => {}
                }
                let mut state = state.lock();
                state.cooldown_secs = state.cooldown_secs.saturating_sub(1);
                if state.cooldown_secs == 0 {
                    return;
                }
            }
        });
    }
}

impl Drop for AuthFormController {
    fn drop(&mut self) {
        if let Some(token) = self.countdown.lock().take() {
            token.cancel();
        }
    }
}

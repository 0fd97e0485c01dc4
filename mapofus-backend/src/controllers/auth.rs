use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, web};
use mapofus_types::{
    ACCESS_TOKEN_COOKIE, ApiResponse, CODE_VERIFIER_COOKIE, CredentialsRequest,
    REFRESH_TOKEN_COOKIE, Session,
};
use serde::Deserialize;
use supabase_client::SupabaseError;
use supabase_client::pkce::PkcePair;

use crate::AppState;
use crate::config::Config;
use crate::rate_limit::{CooldownDecision, CooldownLimiter};

const REGISTER_SUCCESS_MESSAGE: &str = "Check your email to confirm your account.";
const AUTH_CODE_ERROR_PATH: &str = "/auth?error=auth_code_error";
const DEFAULT_OAUTH_PROVIDER: &str = "google";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/login", web::post().to(login));
    cfg.route("/api/register", web::post().to(register));
    cfg.route("/api/logout", web::post().to(logout));
    cfg.route("/api/session", web::get().to(current_session));
    cfg.route("/auth/callback", web::get().to(callback));
    cfg.route("/auth/oauth", web::get().to(oauth_start));
}

/// `Some(response)` when the identifier is still cooling down.
fn enforce_cooldown(
    limiter: &CooldownLimiter,
    identifier: &str,
    action: &str,
) -> Option<HttpResponse> {
    match limiter.check(identifier) {
        Ok(CooldownDecision::Allowed) => None,
        Ok(CooldownDecision::Blocked { .. }) => Some(HttpResponse::TooManyRequests().json(
            ApiResponse::err(format!(
                "Please wait {} seconds before {} again",
                limiter.window().num_seconds(),
                action
            )),
        )),
        Err(e) => {
            log::error!("[COOLDOWN] Store failure, rejecting {} attempt: {}", action, e);
            Some(
                HttpResponse::ServiceUnavailable()
                    .json(ApiResponse::err("Please try again in a moment")),
            )
        }
    }
}

/// Collaborator messages pass through verbatim; transport problems get a
/// generic message.
fn error_text(error: &SupabaseError) -> String {
    match error {
        SupabaseError::Api { .. } => error.message(),
        SupabaseError::Transport(_) => "Authentication service is unavailable".to_string(),
        SupabaseError::Decode(_) => "Unexpected response from authentication service".to_string(),
    }
}

fn session_cookie<'c>(
    name: &'c str,
    value: String,
    max_age: CookieDuration,
    config: &Config,
) -> Cookie<'c> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .finish()
}

fn removal_cookie(name: &str) -> Cookie<'_> {
    let mut cookie = Cookie::build(name, "").path("/").finish();
    cookie.make_removal();
    cookie
}

fn set_session_cookies(builder: &mut HttpResponseBuilder, session: &Session, config: &Config) {
    let access_max_age = session
        .expires_at
        .map(|exp| exp - chrono::Utc::now().timestamp())
        .filter(|secs| *secs > 0)
        .map(CookieDuration::seconds)
        .unwrap_or(CookieDuration::hours(1));

    builder.cookie(session_cookie(
        ACCESS_TOKEN_COOKIE,
        session.access_token.clone(),
        access_max_age,
        config,
    ));
    builder.cookie(session_cookie(
        REFRESH_TOKEN_COOKIE,
        session.refresh_token.clone(),
        CookieDuration::days(30),
        config,
    ));
}

/// Only same-origin relative paths are honoured as redirect targets.
fn sanitize_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

// POST /api/login
async fn login(state: web::Data<AppState>, body: web::Json<CredentialsRequest>) -> HttpResponse {
    let CredentialsRequest { email, password } = body.into_inner();

    if let Some(rejection) = enforce_cooldown(&state.login_limiter, &email, "logging in") {
        return rejection;
    }

    match state.auth.sign_in_with_password(&email, &password).await {
        Ok(session) => {
            log::info!("[AUTH] Login succeeded for user {}", session.user.id);
            let mut response = HttpResponse::Ok();
            set_session_cookies(&mut response, &session, &state.config);
            response.json(ApiResponse::ok())
        }
        Err(e) => {
            log::warn!("[AUTH] Login failed for {}: {}", email, e);
            HttpResponse::InternalServerError().json(ApiResponse::err(error_text(&e)))
        }
    }
}

// POST /api/register
async fn register(state: web::Data<AppState>, body: web::Json<CredentialsRequest>) -> HttpResponse {
    let CredentialsRequest { email, password } = body.into_inner();

    if let Some(rejection) = enforce_cooldown(&state.register_limiter, &email, "registering") {
        return rejection;
    }

    let redirect = state.config.email_redirect_url();
    match state.auth.sign_up(&email, &password, Some(&redirect)).await {
        Ok(()) => {
            log::info!("[AUTH] Sign-up started for {}", email);
            HttpResponse::Ok().json(ApiResponse::ok_with_message(REGISTER_SUCCESS_MESSAGE))
        }
        Err(e) => {
            if e.is_already_registered() {
                log::info!("[AUTH] {} already registered, resending confirmation", email);
                if let Err(resend_err) = state.auth.resend_signup(&email, Some(&redirect)).await {
                    log::warn!("[AUTH] Confirmation resend for {} failed: {}", email, resend_err);
                }
            } else {
                log::warn!("[AUTH] Sign-up failed for {}: {}", email, e);
            }
            HttpResponse::InternalServerError().json(ApiResponse::err(error_text(&e)))
        }
    }
}

// POST /api/logout
async fn logout(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Some(token) = req.cookie(ACCESS_TOKEN_COOKIE) {
        if let Err(e) = state.auth.sign_out(token.value()).await {
            log::warn!("[AUTH] Collaborator sign-out failed: {}", e);
        }
    }

    HttpResponse::Ok()
        .cookie(removal_cookie(ACCESS_TOKEN_COOKIE))
        .cookie(removal_cookie(REFRESH_TOKEN_COOKIE))
        .json(ApiResponse::ok())
}

// GET /api/session
async fn current_session(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let Some(access) = req.cookie(ACCESS_TOKEN_COOKIE) else {
        return HttpResponse::Unauthorized().json(ApiResponse::err("Not signed in"));
    };

    match state.auth.get_user(access.value()).await {
        Ok(user) => HttpResponse::Ok().json(Session {
            access_token: access.value().to_string(),
            refresh_token: req
                .cookie(REFRESH_TOKEN_COOKIE)
                .map(|c| c.value().to_string())
                .unwrap_or_default(),
            expires_at: None,
            user,
        }),
        Err(e) if matches!(e.status(), Some(401 | 403)) => {
            log::info!("[AUTH] Session cookie rejected: {}", e);
            HttpResponse::Unauthorized()
                .cookie(removal_cookie(ACCESS_TOKEN_COOKIE))
                .cookie(removal_cookie(REFRESH_TOKEN_COOKIE))
                .json(ApiResponse::err("Not signed in"))
        }
        Err(e) => {
            log::warn!("[AUTH] Session lookup failed: {}", e);
            HttpResponse::ServiceUnavailable().json(ApiResponse::err(error_text(&e)))
        }
    }
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    next: Option<String>,
}

// GET /auth/callback?code&next
async fn callback(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<CallbackQuery>,
) -> HttpResponse {
    let base_url = &state.config.base_url;
    let next = sanitize_next(query.next.as_deref());

    if let Some(code) = query.code.as_deref() {
        match req.cookie(CODE_VERIFIER_COOKIE) {
            Some(verifier) => {
                match state.auth.exchange_code_for_session(code, verifier.value()).await {
                    Ok(session) => {
                        log::info!("[AUTH] OAuth callback signed in user {}", session.user.id);
                        let mut response = HttpResponse::Found();
                        set_session_cookies(&mut response, &session, &state.config);
                        return response
                            .cookie(removal_cookie(CODE_VERIFIER_COOKIE))
                            .append_header((header::LOCATION, format!("{}{}", base_url, next)))
                            .finish();
                    }
                    Err(e) => log::error!("[AUTH] Auth callback exchange error: {}", e),
                }
            }
            None => log::error!("[AUTH] Auth callback without a code verifier cookie"),
        }
    }

    HttpResponse::Found()
        .append_header((header::LOCATION, format!("{}{}", base_url, AUTH_CODE_ERROR_PATH)))
        .finish()
}

#[derive(Deserialize)]
pub struct OAuthQuery {
    provider: Option<String>,
    next: Option<String>,
}

// GET /auth/oauth?provider&next
async fn oauth_start(state: web::Data<AppState>, query: web::Query<OAuthQuery>) -> HttpResponse {
    let provider = query.provider.as_deref().unwrap_or(DEFAULT_OAUTH_PROVIDER);
    if provider.is_empty() || !provider.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return HttpResponse::BadRequest().json(ApiResponse::err("Unknown OAuth provider"));
    }

    let next = sanitize_next(query.next.as_deref());
    let redirect_to = format!(
        "{}/auth/callback?next={}",
        state.config.base_url,
        urlencoding::encode(next)
    );

    let pair = PkcePair::generate();
    let authorize_url = state.auth.authorize_url(provider, &redirect_to, &pair.challenge);
    log::info!("[AUTH] Handing off to {} OAuth", provider);

    HttpResponse::Found()
        .cookie(session_cookie(
            CODE_VERIFIER_COOKIE,
            pair.verifier,
            CookieDuration::minutes(10),
            &state.config,
        ))
        .append_header((header::LOCATION, authorize_url))
        .finish()
}

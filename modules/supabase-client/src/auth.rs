//! GoTrue auth endpoints.

use async_trait::async_trait;
use mapofus_types::{AuthUser, Session};
use reqwest::Method;
use serde::Serialize;
use serde_json::json;

use crate::client::SupabaseClient;
use crate::error::SupabaseError;

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PkceExchange<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

/// Authentication operations delegated to the collaborator.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, SupabaseError>;

    /// Starts the email-confirmation sign-up flow. No session is issued until
    /// the user follows the link.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        email_redirect_to: Option<&str>,
    ) -> Result<(), SupabaseError>;

    /// Re-send the sign-up confirmation email.
    async fn resend_signup(
        &self,
        email: &str,
        email_redirect_to: Option<&str>,
    ) -> Result<(), SupabaseError>;

    async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<Session, SupabaseError>;

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, SupabaseError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError>;

    /// Provider hand-off URL for the OAuth PKCE flow.
    fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> String;
}

fn with_redirect(path: &str, redirect_to: Option<&str>) -> String {
    match redirect_to {
        Some(url) => format!("{}?redirect_to={}", path, urlencoding::encode(url)),
        None => path.to_string(),
    }
}

#[async_trait]
impl AuthApi for SupabaseClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, SupabaseError> {
        let response = self
            .request(Method::POST, "/auth/v1/token?grant_type=password", None)
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;
        let response = Self::check(response).await?;
        response
            .json::<Session>()
            .await
            .map_err(|e| SupabaseError::Decode(format!("session: {}", e)))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        email_redirect_to: Option<&str>,
    ) -> Result<(), SupabaseError> {
        let path = with_redirect("/auth/v1/signup", email_redirect_to);
        let response = self
            .request(Method::POST, &path, None)
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn resend_signup(
        &self,
        email: &str,
        email_redirect_to: Option<&str>,
    ) -> Result<(), SupabaseError> {
        let path = with_redirect("/auth/v1/resend", email_redirect_to);
        let response = self
            .request(Method::POST, &path, None)
            .json(&json!({ "type": "signup", "email": email }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<Session, SupabaseError> {
        let response = self
            .request(Method::POST, "/auth/v1/token?grant_type=pkce", None)
            .json(&PkceExchange {
                auth_code,
                code_verifier,
            })
            .send()
            .await?;
        let response = Self::check(response).await?;
        response
            .json::<Session>()
            .await
            .map_err(|e| SupabaseError::Decode(format!("session: {}", e)))
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        let response = self
            .request(Method::GET, "/auth/v1/user", Some(access_token))
            .send()
            .await?;
        let response = Self::check(response).await?;
        response
            .json::<AuthUser>()
            .await
            .map_err(|e| SupabaseError::Decode(format!("user: {}", e)))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let response = self
            .request(Method::POST, "/auth/v1/logout?scope=global", Some(access_token))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> String {
        format!(
            "{}?provider={}&redirect_to={}&code_challenge={}&code_challenge_method=s256",
            self.endpoint("/auth/v1/authorize"),
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to),
            urlencoding::encode(code_challenge),
        )
    }
}

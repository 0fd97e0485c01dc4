//! Client for the backend's rate-limited auth routes.

use async_trait::async_trait;
use mapofus_types::{
    ACCESS_TOKEN_COOKIE, ApiResponse, CredentialsRequest, REFRESH_TOKEN_COOKIE, Session,
    SessionTokens,
};
use reqwest::header::{COOKIE, SET_COOKIE};

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("session lookup returned HTTP {0}")]
    Status(u16),
    #[error("unexpected session body: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct RouteResponse {
    pub status: u16,
    pub body: ApiResponse,
    /// Session cookies set by a successful login.
    pub tokens: Option<SessionTokens>,
}

impl RouteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait AuthRoutes: Send + Sync {
    async fn login(&self, credentials: &CredentialsRequest) -> Result<RouteResponse, RouteError>;
    async fn register(&self, credentials: &CredentialsRequest)
    -> Result<RouteResponse, RouteError>;
    /// The session behind the page's auth cookies, `None` when signed out.
    async fn session(&self) -> Result<Option<Session>, RouteError>;
}

pub struct HttpAuthRoutes {
    http: reqwest::Client,
    base_url: String,
    cookie_header: Option<String>,
}

impl HttpAuthRoutes {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: supabase_client::http::shared_client().clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_header: None,
        }
    }

    /// `Cookie` header the page was loaded with; sent on session lookups.
    pub fn with_cookies(mut self, cookie_header: &str) -> Self {
        self.cookie_header = Some(cookie_header.to_string());
        self
    }

    async fn post(
        &self,
        path: &str,
        credentials: &CredentialsRequest,
    ) -> Result<RouteResponse, RouteError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(credentials)
            .send()
            .await?;

        let status = response.status().as_u16();
        let tokens = tokens_from_set_cookie(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );
        let text = response.text().await?;
        let body = serde_json::from_str::<ApiResponse>(&text).unwrap_or_else(|_| {
            if (200..300).contains(&status) {
                ApiResponse::ok()
            } else if text.trim().is_empty() {
                ApiResponse::err(format!("HTTP {}", status))
            } else {
                ApiResponse::err(text)
            }
        });

        Ok(RouteResponse {
            status,
            body,
            tokens,
        })
    }
}

#[async_trait]
impl AuthRoutes for HttpAuthRoutes {
    async fn login(&self, credentials: &CredentialsRequest) -> Result<RouteResponse, RouteError> {
        self.post("/api/login", credentials).await
    }

    async fn register(
        &self,
        credentials: &CredentialsRequest,
    ) -> Result<RouteResponse, RouteError> {
        self.post("/api/register", credentials).await
    }

    async fn session(&self) -> Result<Option<Session>, RouteError> {
        let mut request = self.http.get(format!("{}/api/session", self.base_url));
        if let Some(cookies) = &self.cookie_header {
            request = request.header(COOKIE, cookies);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        session_from_body(status, &text)
    }
}

fn session_from_body(status: u16, body: &str) -> Result<Option<Session>, RouteError> {
    match status {
        200 => serde_json::from_str(body)
            .map(Some)
            .map_err(|e| RouteError::Decode(e.to_string())),
        401 => Ok(None),
        other => Err(RouteError::Status(other)),
    }
}

/// Pull the session cookie pair out of `Set-Cookie` header values. Removal
/// cookies (empty values) are ignored.
pub fn tokens_from_set_cookie<'a>(values: impl Iterator<Item = &'a str>) -> Option<SessionTokens> {
    let mut access = None;
    let mut refresh = None;

    for value in values {
        let pair = value.split(';').next().unwrap_or_default();
        let Some((name, token)) = pair.split_once('=') else {
            continue;
        };
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match name.trim() {
            ACCESS_TOKEN_COOKIE => access = Some(token.to_string()),
            REFRESH_TOKEN_COOKIE => refresh = Some(token.to_string()),
            _ => {}
        }
    }

    Some(SessionTokens {
        access_token: access?,
        refresh_token: refresh?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_from_set_cookie() {
        let headers = [
            "mapofus-access-token=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600",
            "other=1",
            "mapofus-refresh-token=def; Path=/; HttpOnly",
        ];
        let tokens = tokens_from_set_cookie(headers.iter().copied()).unwrap();
        assert_eq!(tokens.access_token, "abc");
        assert_eq!(tokens.refresh_token, "def");
    }

    #[test]
    fn test_missing_or_removed_cookie_yields_none() {
        let only_access = ["mapofus-access-token=abc; Path=/"];
        assert!(tokens_from_set_cookie(only_access.iter().copied()).is_none());

        let removed = [
            "mapofus-access-token=; Max-Age=0",
            "mapofus-refresh-token=; Max-Age=0",
        ];
        assert!(tokens_from_set_cookie(removed.iter().copied()).is_none());
    }

    #[test]
    fn test_session_from_body() {
        let body = r#"{"access_token":"at","refresh_token":"rt","user":{"id":"u1","email":"a@b.c"}}"#;
        let session = session_from_body(200, body).unwrap().unwrap();
        assert_eq!(session.access_token, "at");
        assert_eq!(session.user.id, "u1");
        assert!(session.expires_at.is_none());

        assert!(session_from_body(401, r#"{"error":"Not signed in"}"#).unwrap().is_none());
        assert!(matches!(session_from_body(503, ""), Err(RouteError::Status(503))));
        assert!(matches!(session_from_body(200, "nope"), Err(RouteError::Decode(_))));
    }

    #[test]
    fn test_route_response_success_range() {
        let mut response = RouteResponse {
            status: 200,
            body: ApiResponse::ok(),
            tokens: None,
        };
        assert!(response.is_success());
        response.status = 429;
        assert!(!response.is_success());
    }
}

use reqwest::{Client, Method, RequestBuilder, Response};

use crate::error::SupabaseError;

const DEFAULT_MEMORIES_TABLE: &str = "memories";
const DEFAULT_MEMORIES_BUCKET: &str = "memories";

/// Project URL, public (anon) key and the names of the table and bucket the
/// map writes to.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub memories_table: String,
    pub memories_bucket: String,
}

impl SupabaseConfig {
    pub fn new(url: &str, anon_key: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            memories_table: DEFAULT_MEMORIES_TABLE.to_string(),
            memories_bucket: DEFAULT_MEMORIES_BUCKET.to_string(),
        }
    }
}

/// Client for every collaborator surface. Cheap to clone.
#[derive(Clone)]
pub struct SupabaseClient {
    pub(crate) config: SupabaseConfig,
    pub(crate) http: Client,
}

impl SupabaseClient {
    /// Uses the process-wide shared HTTP client.
    pub fn new(config: SupabaseConfig) -> Self {
        Self {
            config,
            http: crate::http::shared_client().clone(),
        }
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.url, path)
    }

    /// Request carrying the project key. The bearer token is the user's access
    /// token when one is given, the anon key otherwise.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        access_token: Option<&str>,
    ) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.config.anon_key);
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    /// Turn a non-success response into [`SupabaseError::Api`].
    pub(crate) async fn check(response: Response) -> Result<Response, SupabaseError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SupabaseError::from_response(status.as_u16(), &body))
    }
}

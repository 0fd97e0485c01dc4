//! Object storage for memory photos.

use async_trait::async_trait;
use reqwest::Method;

use crate::client::SupabaseClient;
use crate::error::SupabaseError;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `object_name` in the memories bucket. Existing
    /// objects are not overwritten.
    async fn upload(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        access_token: Option<&str>,
    ) -> Result<(), SupabaseError>;

    /// Public URL of an object. Pure string construction, no request.
    fn public_url(&self, object_name: &str) -> String;
}

#[async_trait]
impl ObjectStorage for SupabaseClient {
    async fn upload(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        access_token: Option<&str>,
    ) -> Result<(), SupabaseError> {
        let path = format!(
            "/storage/v1/object/{}/{}",
            self.config.memories_bucket,
            urlencoding::encode(object_name)
        );
        let response = self
            .request(Method::POST, &path, access_token)
            .header("Content-Type", content_type)
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn public_url(&self, object_name: &str) -> String {
        self.endpoint(&format!(
            "/storage/v1/object/public/{}/{}",
            self.config.memories_bucket,
            urlencoding::encode(object_name)
        ))
    }
}

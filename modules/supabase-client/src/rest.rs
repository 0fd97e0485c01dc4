//! PostgREST access to the memories table.

use async_trait::async_trait;
use mapofus_types::{MemoryRecord, NewMemory};
use reqwest::Method;

use crate::client::SupabaseClient;
use crate::error::SupabaseError;

#[async_trait]
pub trait MemoryTable: Send + Sync {
    /// Every row, unfiltered and unpaginated.
    async fn select_all(&self) -> Result<Vec<MemoryRecord>, SupabaseError>;

    /// Insert one row. Row-level security sees the caller's access token when
    /// one is given.
    async fn insert(
        &self,
        memory: &NewMemory,
        access_token: Option<&str>,
    ) -> Result<(), SupabaseError>;
}

#[async_trait]
impl MemoryTable for SupabaseClient {
    async fn select_all(&self) -> Result<Vec<MemoryRecord>, SupabaseError> {
        let path = format!("/rest/v1/{}?select=*", self.config.memories_table);
        let response = self.request(Method::GET, &path, None).send().await?;
        let response = Self::check(response).await?;
        response
            .json::<Vec<MemoryRecord>>()
            .await
            .map_err(|e| SupabaseError::Decode(format!("memories: {}", e)))
    }

    async fn insert(
        &self,
        memory: &NewMemory,
        access_token: Option<&str>,
    ) -> Result<(), SupabaseError> {
        let path = format!("/rest/v1/{}", self.config.memories_table);
        let response = self
            .request(Method::POST, &path, access_token)
            .header("Prefer", "return=minimal")
            .json(&[memory])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

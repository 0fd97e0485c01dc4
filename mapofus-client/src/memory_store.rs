//! Loading and saving memories through the collaborator.

use chrono::Utc;
use mapofus_types::{Coordinates, MemoryRecord, NewMemory};
use std::sync::Arc;
use supabase_client::{MemoryTable, ObjectStorage, SupabaseError};

/// A photo picked in the memory form.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ImageAttachment {
    /// Text after the last `.`, or the whole name when there is none.
    pub fn extension(&self) -> &str {
        self.file_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.file_name)
    }

    fn object_name(&self, stamp_ms: i64) -> String {
        format!("{}.{}", stamp_ms, self.extension())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("no location selected")]
    NoPendingLocation,
    #[error("invalid memory: {0}")]
    Invalid(String),
    #[error("image upload failed: {0}")]
    Upload(SupabaseError),
    #[error("saving memory failed: {0}")]
    Insert(SupabaseError),
}

#[derive(Clone)]
pub struct MemoryStoreClient {
    table: Arc<dyn MemoryTable>,
    storage: Arc<dyn ObjectStorage>,
}

impl MemoryStoreClient {
    pub fn new(table: Arc<dyn MemoryTable>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { table, storage }
    }

    /// All memories. A failed read is logged and shows as an empty map.
    pub async fn fetch_all(&self) -> Vec<MemoryRecord> {
        match self.table.select_all().await {
            Ok(records) => records,
            Err(e) => {
                log::error!("[MEMORIES] Error fetching memories: {}", e);
                Vec::new()
            }
        }
    }

    /// Upload the photo (if any), then insert the row pointing at it.
    ///
    /// No insert is attempted when the upload fails. An upload followed by a
    /// failed insert leaves the object in the bucket.
    pub async fn submit(
        &self,
        content: &str,
        image: Option<ImageAttachment>,
        location: Coordinates,
        access_token: Option<&str>,
    ) -> Result<NewMemory, SubmitError> {
        let mut memory = NewMemory {
            content: content.to_string(),
            image_url: None,
            latitude: location.latitude,
            longitude: location.longitude,
        };
        memory.validate().map_err(SubmitError::Invalid)?;

        let mut uploaded = None;
        if let Some(image) = image {
            let object_name = image.object_name(Utc::now().timestamp_millis());
            self.storage
                .upload(&object_name, image.bytes, &image.content_type, access_token)
                .await
                .map_err(SubmitError::Upload)?;
            memory.image_url = Some(self.storage.public_url(&object_name));
            uploaded = Some(object_name);
        }

        if let Err(e) = self.table.insert(&memory, access_token).await {
            if let Some(object_name) = uploaded {
                log::warn!(
                    "[MEMORIES] Insert failed after uploading '{}'; object left in storage",
                    object_name
                );
            }
            return Err(SubmitError::Insert(e));
        }

        log::info!(
            "[MEMORIES] Saved memory at ({}, {})",
            memory.latitude,
            memory.longitude
        );
        Ok(memory)
    }
}

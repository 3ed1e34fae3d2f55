//! Upload record repository.

use crate::error::MetadataResult;
use crate::models::UploadRecordRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for uploaded media records.
#[async_trait]
pub trait UploadRepo: Send + Sync {
    /// Record an uploaded media object.
    async fn create_upload(&self, upload: &UploadRecordRow) -> MetadataResult<()>;

    /// Most recent upload for a (user, quest) pair, if any.
    async fn latest_upload_for_quest(
        &self,
        user_id: &str,
        quest_id: Uuid,
    ) -> MetadataResult<Option<UploadRecordRow>>;

    /// All uploads attached to a quest, oldest first.
    ///
    /// Used by the startup reconciliation job to backfill score records for
    /// historical photo-mission uploads.
    async fn list_uploads_with_quest(&self) -> MetadataResult<Vec<UploadRecordRow>>;
}

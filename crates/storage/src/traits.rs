//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Object store interface for quest media.
///
/// Implementations hold private objects; callers obtain read access only
/// through [`ObjectStore::presign_get`], which mints a fresh time-limited
/// signed URL per call. Signed URLs are never persisted.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get an object's full contents.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Store an object, overwriting any existing object at the key.
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StorageResult<()>;

    /// Delete an object. Returns `NotFound` if the key does not exist.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// List object keys under a prefix, in no particular order.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Mint a signed URL granting read access to a private object for the
    /// given validity window.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Get the backend name for diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Verify the backend is reachable and writable.
    async fn health_check(&self) -> StorageResult<()>;
}

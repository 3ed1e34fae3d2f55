//! Object storage abstraction for Wayquest quest media.
//!
//! Media objects are private by default: nothing ever serves a stored static
//! URL. Read access happens through short-lived signed URLs minted per
//! response via [`ObjectStore::presign_get`].

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemBackend;
pub use backends::s3::S3Backend;
pub use error::{StorageError, StorageResult};
pub use traits::ObjectStore;

use std::sync::Arc;
use wayquest_core::config::StorageConfig;

/// Create a storage backend from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend) as Arc<dyn ObjectStore>)
        }
        StorageConfig::S3 {
            bucket,
            endpoint,
            region,
            prefix,
            access_key_id,
            secret_access_key,
            force_path_style,
        } => {
            let backend = S3Backend::new(
                bucket,
                endpoint.clone(),
                region.clone(),
                prefix.clone(),
                access_key_id.clone(),
                secret_access_key.clone(),
                *force_path_style,
            )
            .await?;
            Ok(Arc::new(backend) as Arc<dyn ObjectStore>)
        }
    }
}

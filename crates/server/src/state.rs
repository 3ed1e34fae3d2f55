//! Application state shared across handlers.

use crate::media::{DefaultImageDirectory, MediaResolver};
use std::sync::Arc;
use wayquest_core::config::AppConfig;
use wayquest_metadata::MetadataStore;
use wayquest_storage::ObjectStore;

/// Shared application state.
///
/// The default-image directory inside [`MediaResolver`] holds the only
/// cross-request mutable state; everything else is read from the backing
/// stores per request.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Object storage backend.
    pub storage: Arc<dyn ObjectStore>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Media resolver with the default-image cache.
    pub media: Arc<MediaResolver>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        let defaults = Arc::new(DefaultImageDirectory::new(
            storage.clone(),
            config.media.default_image_prefix.clone(),
            config.media.default_image_ttl(),
        ));
        let media = Arc::new(MediaResolver::new(
            storage.clone(),
            metadata.clone(),
            defaults,
            config.media.signed_url_ttl(),
        ));

        Self {
            config: Arc::new(config),
            storage,
            metadata,
            media,
        }
    }
}

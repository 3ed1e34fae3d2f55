//! Media resolution: default-image directory cache and display URL minting.
//!
//! Display URLs are never stored. Every history response mints fresh signed
//! URLs against the storage keys it is about to serve, so a handle can never
//! be served stale or expired. Failures here are secondary enrichments and
//! degrade to `None` rather than failing the caller's request.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;
use wayquest_core::MAX_DEFAULT_IMAGE_SLOTS;
use wayquest_metadata::models::ScoreRecordRow;
use wayquest_metadata::MetadataStore;
use wayquest_storage::ObjectStore;

/// Timeout for a single store round-trip (listing or presigning).
const STORE_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// One cached listing of the default-image prefix.
struct CachedListing {
    keys: Vec<String>,
    fetched_at: Instant,
}

/// Lists and caches the fixed pool of default fallback images.
///
/// Holds the only long-lived in-memory state in the process. The cache is
/// populated lazily, invalidated purely by time, and never explicitly
/// cleared; it is always safe to recompute by re-listing the store.
pub struct DefaultImageDirectory {
    storage: Arc<dyn ObjectStore>,
    prefix: String,
    ttl: Duration,
    cache: RwLock<Option<CachedListing>>,
}

impl DefaultImageDirectory {
    /// Create a directory over the given default-image prefix.
    pub fn new(storage: Arc<dyn ObjectStore>, prefix: String, ttl: Duration) -> Self {
        Self {
            storage,
            prefix,
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// The ordered set of default fallback image keys.
    ///
    /// Within the TTL window this returns the cached listing with no I/O.
    /// On listing failure it returns an empty list: "no defaults available"
    /// is a normal degraded state, not an error.
    pub async fn list(&self) -> Vec<String> {
        if let Some(keys) = self.cached() {
            return keys;
        }

        let listed =
            match tokio::time::timeout(STORE_CALL_TIMEOUT, self.storage.list(&self.prefix)).await
            {
                Ok(Ok(keys)) => keys,
                Ok(Err(e)) => {
                    tracing::warn!(prefix = %self.prefix, error = %e, "default-image listing failed");
                    return Vec::new();
                }
                Err(_) => {
                    tracing::warn!(prefix = %self.prefix, "default-image listing timed out");
                    return Vec::new();
                }
            };

        let mut keys: Vec<String> = listed
            .into_iter()
            .filter(|key| is_default_image_key(key))
            .collect();
        keys.sort();

        // No lock is held across the listing: concurrent refreshes may both
        // hit the store and both write the entry. All writers compute the
        // same deterministic result from the same external state, so the
        // race is idempotent, not corrupting.
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        *cache = Some(CachedListing {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        keys
    }

    fn cached(&self) -> Option<Vec<String>> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        cache
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.keys.clone())
    }
}

/// Canonical default-image naming pattern: `default_*` with an image
/// extension, anywhere under the default prefix.
fn is_default_image_key(key: &str) -> bool {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    let Some((stem, extension)) = file_name.rsplit_once('.') else {
        return false;
    };
    stem.starts_with("default_")
        && matches!(extension.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png")
}

/// Attaches display URLs to history entries.
pub struct MediaResolver {
    storage: Arc<dyn ObjectStore>,
    metadata: Arc<dyn MetadataStore>,
    defaults: Arc<DefaultImageDirectory>,
    signed_url_ttl: Duration,
}

impl MediaResolver {
    pub fn new(
        storage: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
        defaults: Arc<DefaultImageDirectory>,
        signed_url_ttl: Duration,
    ) -> Self {
        Self {
            storage,
            metadata,
            defaults,
            signed_url_ttl,
        }
    }

    /// Resolve one freshly signed display URL per history entry.
    ///
    /// The user's own upload wins; otherwise the next unused default-image
    /// slot is assigned in listing order, up to three slots per listing.
    /// Entries that resolve to no key, or whose key cannot be signed, get
    /// `None`, never an error.
    pub async fn attach_image_urls(
        &self,
        user_id: &str,
        entries: &[ScoreRecordRow],
    ) -> Vec<Option<String>> {
        let defaults = self.defaults.list().await;
        let mut next_default_slot = 0usize;
        let mut urls = Vec::with_capacity(entries.len());

        for entry in entries {
            let key = match self.upload_key_for(user_id, entry.quest_id).await {
                Some(key) => Some(key),
                None => {
                    if next_default_slot < defaults.len()
                        && next_default_slot < MAX_DEFAULT_IMAGE_SLOTS
                    {
                        let key = defaults[next_default_slot].clone();
                        next_default_slot += 1;
                        Some(key)
                    } else {
                        None
                    }
                }
            };

            match key {
                Some(key) => urls.push(self.presign_soft(&key).await),
                None => urls.push(None),
            }
        }

        urls
    }

    /// Mint a signed URL for an upload response. Same soft-failure policy as
    /// history resolution: the upload has already succeeded, so a signing
    /// failure degrades to no URL.
    pub async fn presign_upload(&self, key: &str) -> Option<String> {
        self.presign_soft(key).await
    }

    async fn upload_key_for(&self, user_id: &str, quest_id: Uuid) -> Option<String> {
        match self.metadata.latest_upload_for_quest(user_id, quest_id).await {
            Ok(upload) => upload.map(|u| u.object_key),
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    quest_id = %quest_id,
                    error = %e,
                    "upload lookup failed, falling back to default image"
                );
                None
            }
        }
    }

    async fn presign_soft(&self, key: &str) -> Option<String> {
        match tokio::time::timeout(
            STORE_CALL_TIMEOUT,
            self.storage.presign_get(key, self.signed_url_ttl),
        )
        .await
        {
            Ok(Ok(url)) => Some(url),
            Ok(Err(e)) => {
                tracing::warn!(key = %key, error = %e, "failed to sign media URL");
                None
            }
            Err(_) => {
                tracing::warn!(key = %key, "signing media URL timed out");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wayquest_storage::{FilesystemBackend, StorageResult};

    /// ObjectStore wrapper that counts list calls, for cache TTL assertions.
    struct CountingStore {
        inner: FilesystemBackend,
        list_calls: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStore for CountingStore {
        async fn exists(&self, key: &str) -> StorageResult<bool> {
            self.inner.exists(key).await
        }

        async fn get(&self, key: &str) -> StorageResult<Bytes> {
            self.inner.get(key).await
        }

        async fn put(
            &self,
            key: &str,
            data: Bytes,
            content_type: Option<&str>,
        ) -> StorageResult<()> {
            self.inner.put(key, data, content_type).await
        }

        async fn delete(&self, key: &str) -> StorageResult<()> {
            self.inner.delete(key).await
        }

        async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list(prefix).await
        }

        async fn presign_get(
            &self,
            key: &str,
            expires_in: Duration,
        ) -> StorageResult<String> {
            self.inner.presign_get(key, expires_in).await
        }

        fn backend_name(&self) -> &'static str {
            "counting"
        }

        async fn health_check(&self) -> StorageResult<()> {
            self.inner.health_check().await
        }
    }

    async fn counting_store(temp: &tempfile::TempDir) -> Arc<CountingStore> {
        let inner = FilesystemBackend::new(temp.path()).await.unwrap();
        for key in [
            "default/default_2.jpg",
            "default/default_1.jpg",
            "default/default_3.png",
            "default/readme.txt",
            "uploads/u1/photo.jpg",
        ] {
            inner.put(key, Bytes::from_static(b"x"), None).await.unwrap();
        }
        Arc::new(CountingStore {
            inner,
            list_calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn listing_is_filtered_and_sorted() {
        let temp = tempfile::tempdir().unwrap();
        let store = counting_store(&temp).await;
        let directory = DefaultImageDirectory::new(
            store.clone(),
            "default/".to_string(),
            Duration::from_secs(300),
        );

        let keys = directory.list().await;
        assert_eq!(
            keys,
            vec![
                "default/default_1.jpg",
                "default/default_2.jpg",
                "default/default_3.png"
            ]
        );
    }

    #[tokio::test]
    async fn second_call_within_ttl_does_no_io() {
        let temp = tempfile::tempdir().unwrap();
        let store = counting_store(&temp).await;
        let directory = DefaultImageDirectory::new(
            store.clone(),
            "default/".to_string(),
            Duration::from_secs(300),
        );

        let first = directory.list().await;
        let second = directory.list().await;
        assert_eq!(first, second);
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_triggers_exactly_one_relisting() {
        let temp = tempfile::tempdir().unwrap();
        let store = counting_store(&temp).await;
        let directory = DefaultImageDirectory::new(
            store.clone(),
            "default/".to_string(),
            Duration::ZERO,
        );

        directory.list().await;
        directory.list().await;
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn default_image_pattern() {
        assert!(is_default_image_key("default/default_1.jpg"));
        assert!(is_default_image_key("default/default_sunrise.PNG"));
        assert!(!is_default_image_key("default/readme.txt"));
        assert!(!is_default_image_key("default/cover.jpg"));
        assert!(!is_default_image_key("default/default_1"));
    }
}

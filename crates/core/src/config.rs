//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Media resolution configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Key prefix under which default fallback images live.
    #[serde(default = "default_image_prefix")]
    pub default_image_prefix: String,
    /// Key prefix under which user uploads are stored.
    #[serde(default = "default_upload_prefix")]
    pub upload_prefix: String,
    /// How long the default-image listing may be served from cache.
    #[serde(default = "default_image_ttl_secs")]
    pub default_image_ttl_secs: u64,
    /// Validity window for signed media URLs.
    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,
}

fn default_image_prefix() -> String {
    "default/".to_string()
}

fn default_upload_prefix() -> String {
    "uploads/".to_string()
}

fn default_image_ttl_secs() -> u64 {
    300
}

fn default_signed_url_ttl_secs() -> u64 {
    300
}

impl MediaConfig {
    /// Default-image cache TTL as a Duration.
    pub fn default_image_ttl(&self) -> Duration {
        Duration::from_secs(self.default_image_ttl_secs)
    }

    /// Signed URL validity as a Duration.
    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            default_image_prefix: default_image_prefix(),
            upload_prefix: default_upload_prefix(),
            default_image_ttl_secs: default_image_ttl_secs(),
            signed_url_ttl_secs: default_signed_url_ttl_secs(),
        }
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for storage.
        path: PathBuf,
    },
    /// S3-compatible storage.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Optional endpoint URL (for MinIO, etc.).
        endpoint: Option<String>,
        /// AWS region.
        region: Option<String>,
        /// Optional key prefix.
        prefix: Option<String>,
        /// AWS access key ID. Falls back to the ambient credential chain if
        /// not set.
        access_key_id: Option<String>,
        /// AWS secret access key. Falls back to the ambient credential chain
        /// if not set.
        secret_access_key: Option<String>,
        /// Force path-style URLs (`endpoint/bucket/key`). Required for MinIO
        /// and some S3-compatible services.
        #[serde(default)]
        force_path_style: bool,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/media"),
        }
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite file store (single-node deployments and tests).
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
    /// PostgreSQL store.
    Postgres {
        /// Connection URL.
        url: String,
        /// Maximum pool connections.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

fn default_max_connections() -> u32 {
    5
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/wayquest.db"),
        }
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

impl AppConfig {
    /// Create a configuration with test-friendly defaults.
    ///
    /// **For testing only.** Storage and metadata paths still need to be
    /// pointed at a temp directory by the caller.
    pub fn for_testing() -> Self {
        Self::default()
    }
}

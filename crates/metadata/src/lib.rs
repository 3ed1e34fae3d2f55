//! Metadata store abstraction and implementations for Wayquest.
//!
//! This crate provides the control-plane data model:
//! - Quest definitions keyed by region and type
//! - The write-once score ledger per (user, quest)
//! - Upload records linking media objects to quests

pub mod error;
pub mod models;
pub mod postgres;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use postgres::PostgresStore;
pub use store::{MetadataStore, SqliteStore};

use std::sync::Arc;
use wayquest_core::config::MetadataConfig;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        MetadataConfig::Sqlite { path } => {
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
        MetadataConfig::Postgres {
            url,
            max_connections,
        } => {
            tracing::info!("Connecting to PostgreSQL");
            let store = PostgresStore::from_url(url, *max_connections).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}

//! Wayquest HTTP server.
//!
//! Wires the quest catalog, the write-once score ledger, and the media store
//! into the public API: quest selection with type-balanced fallback,
//! idempotent answer checking, history with freshly signed image URLs, and
//! multipart photo uploads with automatic photo-mission scoring.

pub mod error;
pub mod handlers;
pub mod media;
pub mod reconcile;
pub mod routes;
pub mod scoring;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;

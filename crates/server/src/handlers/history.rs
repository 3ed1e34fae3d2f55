//! Quest history handler.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;
use wayquest_metadata::MetadataStore;

/// One answered quest in a user's history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub quest_id: Uuid,
    pub region: String,
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub awarded_score: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub answered_at: OffsetDateTime,
    /// Freshly signed display URL, or null when no image resolves.
    pub image_url: Option<String>,
}

/// A user's answered quests, newest first.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub quests: Vec<HistoryEntry>,
}

/// GET /users/{user_id}/quests - Ordered history with resolved image URLs.
///
/// The ledger read is the primary intent and fails the request if the store
/// is unreachable. Image resolution is a secondary enrichment: every entry
/// gets a freshly signed URL or null, never an error.
#[tracing::instrument(skip(state), fields(user_id = %user_id))]
pub async fn user_quest_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<HistoryResponse>> {
    let entries = state.metadata.list_scores_for_user(&user_id).await?;
    let image_urls = state.media.attach_image_urls(&user_id, &entries).await;

    let quests = entries
        .into_iter()
        .zip(image_urls)
        .map(|(entry, image_url)| HistoryEntry {
            quest_id: entry.quest_id,
            region: entry.region().display_label(),
            question: entry.question,
            user_answer: entry.user_answer,
            correct_answer: entry.correct_answer,
            awarded_score: entry.awarded_score,
            answered_at: entry.answered_at,
            image_url,
        })
        .collect();

    Ok(Json(HistoryResponse { quests }))
}

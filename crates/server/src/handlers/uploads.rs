//! Media upload handler.

use crate::error::{ApiError, ApiResult};
use crate::scoring::{persist_score_best_effort, photo_score_record};
use crate::state::AppState;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;
use wayquest_core::QuestType;
use wayquest_metadata::models::UploadRecordRow;
use wayquest_metadata::MetadataStore;
use wayquest_storage::ObjectStore;

/// Fallback content type for uploads without one.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Upload result: the storage key plus a freshly signed URL. The URL is
/// minted at response time and never persisted; a signing failure degrades
/// to null since the upload itself has already succeeded.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub key: String,
    pub url: Option<String>,
}

struct UploadedFile {
    data: Bytes,
    content_type: String,
    extension: Option<String>,
}

/// POST /uploads - Store a media object and record it.
///
/// Multipart fields: `user_id` (required), `quest_id` (optional), `file`
/// (required). Attaching a file to a photo-type quest fires the same
/// one-time score insert as the explicit check path, so the two can never
/// double-count.
#[tracing::instrument(skip(state, multipart), fields(user_id, quest_id))]
pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let mut user_id: Option<String> = None;
    let mut quest_id: Option<Uuid> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "user_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("invalid user_id field: {e}")))?;
                let value = value.trim().to_string();
                if !value.is_empty() {
                    user_id = Some(value);
                }
            }
            "quest_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("invalid quest_id field: {e}")))?;
                let value = value.trim();
                if !value.is_empty() {
                    let parsed = Uuid::parse_str(value).map_err(|_| {
                        ApiError::BadRequest(format!("quest_id is not a valid id: {value}"))
                    })?;
                    quest_id = Some(parsed);
                }
            }
            "file" => {
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let extension = field
                    .file_name()
                    .and_then(|name| name.rsplit_once('.'))
                    .map(|(_, ext)| ext.to_ascii_lowercase())
                    .filter(|ext| !ext.is_empty() && ext.chars().all(char::is_alphanumeric));
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("invalid file field: {e}")))?;
                file = Some(UploadedFile {
                    data,
                    content_type,
                    extension,
                });
            }
            _ => {}
        }
    }

    let user_id =
        user_id.ok_or_else(|| ApiError::BadRequest("user_id is required".to_string()))?;
    let file = file.ok_or_else(|| ApiError::BadRequest("file is required".to_string()))?;
    if file.data.is_empty() {
        return Err(ApiError::BadRequest("file is empty".to_string()));
    }

    tracing::Span::current().record("user_id", user_id.as_str());

    // The upload record carries a quest foreign key, so an unknown quest is
    // rejected up front rather than at insert time.
    let quest = match quest_id {
        Some(quest_id) => {
            tracing::Span::current().record("quest_id", quest_id.to_string().as_str());
            Some(
                state
                    .metadata
                    .get_quest(quest_id)
                    .await?
                    .ok_or_else(|| ApiError::NotFound(format!("quest {quest_id} not found")))?,
            )
        }
        None => None,
    };

    let object_key = format!(
        "{}{}/{}{}",
        state.config.media.upload_prefix,
        user_id,
        Uuid::new_v4(),
        file.extension
            .as_deref()
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default()
    );

    let byte_size = file.data.len() as i64;
    state
        .storage
        .put(&object_key, file.data, Some(&file.content_type))
        .await?;

    let uploaded_at = OffsetDateTime::now_utc();
    let record = UploadRecordRow {
        upload_id: Uuid::new_v4(),
        user_id: user_id.clone(),
        quest_id: quest.as_ref().map(|q| q.quest_id),
        object_key: object_key.clone(),
        byte_size,
        content_type: file.content_type.clone(),
        uploaded_at,
    };
    state.metadata.create_upload(&record).await?;

    // Photo-mission completion: same one-time insert as the check path.
    if let Some(quest) = &quest {
        if quest.quest_type() == QuestType::Photo {
            let score = photo_score_record(quest, &user_id, uploaded_at);
            persist_score_best_effort(state.metadata.as_ref(), &score).await;
        }
    }

    let url = state.media.presign_upload(&object_key).await;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            key: object_key,
            url,
        }),
    ))
}

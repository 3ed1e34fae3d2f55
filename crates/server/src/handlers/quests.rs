//! Quest selection and answer checking handlers.

use crate::error::{ApiError, ApiResult};
use crate::scoring::{persist_score_best_effort, score_record_for_answer};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use wayquest_core::{
    answers_match, normalize_answer, QuestType, Region, AWARDED_SCORE_CORRECT,
    AWARDED_SCORE_INCORRECT,
};
use wayquest_metadata::models::QuestRow;
use wayquest_metadata::MetadataStore;

/// Upload route referenced by photo-quest responses.
const UPLOAD_ENDPOINT: &str = "/uploads";

/// Query parameters for quest selection.
#[derive(Debug, Deserialize)]
pub struct RandomQuestParams {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
}

/// Four option slots keyed A-D.
#[derive(Debug, Serialize)]
pub struct QuestOptions {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
}

impl QuestOptions {
    fn from_quest(quest: &QuestRow) -> Self {
        Self {
            a: quest.option_a.clone(),
            b: quest.option_b.clone(),
            c: quest.option_c.clone(),
            d: quest.option_d.clone(),
        }
    }
}

/// Quest body returned by selection. The shape varies by resolved type: a
/// question quest carries the four options and never the correct answer; a
/// photo quest carries the photo-taking instruction and the upload route
/// instead.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomQuestResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub quest_type: &'static str,
    pub region: String,
    pub score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<QuestOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_endpoint: Option<&'static str>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// GET /quests/random - Pick one quest for the region filter.
///
/// Draws the *requested* type with equal probability per request, so a
/// region with nine question quests and one photo quest still offers the
/// photo mission about half the time. If the drawn type has no quest in the
/// region, the opposite type is tried once; uniform-random selection among
/// the matches of the resolved type.
#[tracing::instrument(skip(state, params), fields(city, quest_type))]
pub async fn random_quest(
    State(state): State<AppState>,
    Query(params): Query<RandomQuestParams>,
) -> ApiResult<Json<RandomQuestResponse>> {
    let city = non_empty(params.city)
        .ok_or_else(|| ApiError::BadRequest("city is required".to_string()))?;
    let region = Region::new(city, non_empty(params.town), non_empty(params.village));
    tracing::Span::current().record("city", region.city.as_str());

    let quests = state.metadata.list_quests_in_region(&region).await?;
    if quests.is_empty() {
        return Err(no_quest_for_region(&state, &region).await);
    }

    let (photo, question): (Vec<&QuestRow>, Vec<&QuestRow>) = quests
        .iter()
        .partition(|quest| quest.quest_type() == QuestType::Photo);

    // Fair coin on the requested type, independent per request.
    let drawn = if rand::random::<bool>() {
        QuestType::Photo
    } else {
        QuestType::Question
    };

    let primary = match drawn {
        QuestType::Photo => &photo,
        QuestType::Question => &question,
    };

    // Single opposite-type fallback, not a retry loop. The region is known
    // to be non-empty, so the fallback pool always has a quest.
    let (resolved, pool) = if primary.is_empty() {
        let fallback = match drawn.opposite() {
            QuestType::Photo => &photo,
            QuestType::Question => &question,
        };
        (drawn.opposite(), fallback)
    } else {
        (drawn, primary)
    };

    let quest = pool[rand::thread_rng().gen_range(0..pool.len())];
    tracing::Span::current().record("quest_type", resolved.as_str());

    let response = match resolved {
        QuestType::Question => RandomQuestResponse {
            id: quest.quest_id,
            quest_type: resolved.as_str(),
            region: quest.region().display_label(),
            score: quest.score,
            question: Some(quest.question.clone()),
            options: Some(QuestOptions::from_quest(quest)),
            instruction: None,
            upload_endpoint: None,
        },
        QuestType::Photo => RandomQuestResponse {
            id: quest.quest_id,
            quest_type: resolved.as_str(),
            region: quest.region().display_label(),
            score: quest.score,
            question: None,
            options: None,
            instruction: Some(quest.question.clone()),
            upload_endpoint: Some(UPLOAD_ENDPOINT),
        },
    };

    Ok(Json(response))
}

/// Build the 404 for a region without quests, listing the regions that do
/// have quests as a diagnostic aid. A region with zero quests and a region
/// missing both types intentionally produce the same error.
async fn no_quest_for_region(state: &AppState, region: &Region) -> ApiError {
    let known = match state.metadata.list_regions_with_quests().await {
        Ok(regions) => regions
            .iter()
            .map(Region::display_label)
            .collect::<Vec<_>>()
            .join(", "),
        Err(e) => {
            tracing::warn!(error = %e, "could not list regions for diagnostics");
            String::new()
        }
    };

    if known.is_empty() {
        ApiError::NotFound(format!("no quest for region {}", region.display_label()))
    } else {
        ApiError::NotFound(format!(
            "no quest for region {}; regions with quests: {}",
            region.display_label(),
            known
        ))
    }
}

/// Answer submission body.
#[derive(Debug, Deserialize)]
pub struct CheckAnswerRequest {
    pub answer: Option<String>,
    pub user_id: Option<String>,
}

/// Quest detail embedded in the verification result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestDetail {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub quest_type: &'static str,
    pub region: String,
    pub question: String,
    pub options: QuestOptions,
    pub correct_answer: String,
}

/// Verification result. `awarded_score` is what persists; `score` is the
/// quest's nominal weight, informational only.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAnswerResponse {
    pub quest: QuestDetail,
    pub correct: bool,
    pub user_answer: String,
    pub awarded_score: i32,
    pub score: i32,
}

/// POST /quests/{id}/check - Verify an answer and record it once.
///
/// The response always reflects the freshly computed comparison. When
/// `user_id` is present the result is persisted through a single
/// insert-if-absent, so replays never overwrite the original outcome;
/// persistence failure is logged and never fails the request.
#[tracing::instrument(skip(state, body), fields(quest_id = %quest_id))]
pub async fn check_answer(
    State(state): State<AppState>,
    Path(quest_id): Path<Uuid>,
    Json(body): Json<CheckAnswerRequest>,
) -> ApiResult<Json<CheckAnswerResponse>> {
    let quest = state
        .metadata
        .get_quest(quest_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("quest {quest_id} not found")))?;

    let answer = body
        .answer
        .as_deref()
        .and_then(normalize_answer)
        .ok_or_else(|| ApiError::BadRequest("answer is required".to_string()))?;

    let correct = answers_match(&answer, &quest.correct_answer);
    let awarded_score = if correct {
        AWARDED_SCORE_CORRECT
    } else {
        AWARDED_SCORE_INCORRECT
    };

    if let Some(user_id) = body.user_id.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        let record = score_record_for_answer(
            &quest,
            user_id,
            &answer,
            awarded_score,
            OffsetDateTime::now_utc(),
        );
        persist_score_best_effort(state.metadata.as_ref(), &record).await;
    }

    let response = CheckAnswerResponse {
        quest: QuestDetail {
            id: quest.quest_id,
            quest_type: quest.quest_type().as_str(),
            region: quest.region().display_label(),
            question: quest.question.clone(),
            options: QuestOptions::from_quest(&quest),
            correct_answer: quest.correct_answer.clone(),
        },
        correct,
        user_answer: answer,
        awarded_score,
        score: quest.score,
    };

    Ok(Json(response))
}

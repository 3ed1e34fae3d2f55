//! Score recording shared by the check, upload, and reconciliation paths.

use time::OffsetDateTime;
use uuid::Uuid;
use wayquest_core::{AWARDED_SCORE_CORRECT, PHOTO_CORRECT_ANSWER};
use wayquest_metadata::models::{QuestRow, ScoreRecordRow};
use wayquest_metadata::MetadataStore;

/// Build a score record snapshotting the quest's region and question text.
pub fn score_record_for_answer(
    quest: &QuestRow,
    user_id: &str,
    user_answer: &str,
    awarded_score: i32,
    answered_at: OffsetDateTime,
) -> ScoreRecordRow {
    ScoreRecordRow {
        record_id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        quest_id: quest.quest_id,
        city: quest.city.clone(),
        town: quest.town.clone(),
        village: quest.village.clone(),
        question: quest.question.clone(),
        user_answer: user_answer.to_string(),
        correct_answer: quest.correct_answer.clone(),
        awarded_score,
        answered_at,
    }
}

/// Build the sentinel score record for a completed photo mission.
///
/// The live auto-scoring path and the startup reconciliation both use this,
/// so the two can never disagree on the stored values.
pub fn photo_score_record(
    quest: &QuestRow,
    user_id: &str,
    answered_at: OffsetDateTime,
) -> ScoreRecordRow {
    score_record_for_answer(
        quest,
        user_id,
        PHOTO_CORRECT_ANSWER,
        AWARDED_SCORE_CORRECT,
        answered_at,
    )
}

/// Persist a score record, treating both "inserted" and "prior record wins"
/// as success. Store failures are logged and swallowed: score persistence is
/// a secondary effect that must never fail the caller's request.
pub async fn persist_score_best_effort(metadata: &dyn MetadataStore, record: &ScoreRecordRow) {
    match metadata.insert_score_if_absent(record).await {
        Ok(true) => {
            tracing::debug!(
                user_id = %record.user_id,
                quest_id = %record.quest_id,
                awarded_score = record.awarded_score,
                "score record persisted"
            );
        }
        Ok(false) => {
            tracing::debug!(
                user_id = %record.user_id,
                quest_id = %record.quest_id,
                "score record already exists, first write wins"
            );
        }
        Err(e) => {
            tracing::warn!(
                user_id = %record.user_id,
                quest_id = %record.quest_id,
                error = %e,
                "failed to persist score record"
            );
        }
    }
}

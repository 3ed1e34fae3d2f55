//! Quest and upload fixtures.

use time::OffsetDateTime;
use uuid::Uuid;
use wayquest_core::{PHOTO_CORRECT_ANSWER, PHOTO_OPTION_SENTINEL};
use wayquest_metadata::models::{QuestRow, UploadRecordRow};

/// A multiple-choice quest with distinct options; correct answer "B".
#[allow(dead_code)]
pub fn question_quest(city: &str, town: Option<&str>, village: Option<&str>) -> QuestRow {
    QuestRow {
        quest_id: Uuid::new_v4(),
        city: city.to_string(),
        town: town.map(str::to_string),
        village: village.map(str::to_string),
        question: "Which statue stands at the harbor entrance?".to_string(),
        option_a: "Dol hareubang".to_string(),
        option_b: "Haenyeo statue".to_string(),
        option_c: "Wind gate".to_string(),
        option_d: "Basalt tower".to_string(),
        correct_answer: "B".to_string(),
        score: 10,
        created_at: OffsetDateTime::now_utc(),
    }
}

/// A photo-mission quest: sentinel text in all four option slots.
#[allow(dead_code)]
pub fn photo_quest(city: &str, town: Option<&str>, village: Option<&str>) -> QuestRow {
    QuestRow {
        quest_id: Uuid::new_v4(),
        city: city.to_string(),
        town: town.map(str::to_string),
        village: village.map(str::to_string),
        question: "Take a photo of the lighthouse at sunset".to_string(),
        option_a: PHOTO_OPTION_SENTINEL.to_string(),
        option_b: PHOTO_OPTION_SENTINEL.to_string(),
        option_c: PHOTO_OPTION_SENTINEL.to_string(),
        option_d: PHOTO_OPTION_SENTINEL.to_string(),
        correct_answer: PHOTO_CORRECT_ANSWER.to_string(),
        score: 10,
        created_at: OffsetDateTime::now_utc(),
    }
}

/// An upload record pointing at an existing storage key.
#[allow(dead_code)]
pub fn upload_record(
    user_id: &str,
    quest_id: Option<Uuid>,
    object_key: &str,
    uploaded_at: OffsetDateTime,
) -> UploadRecordRow {
    UploadRecordRow {
        upload_id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        quest_id,
        object_key: object_key.to_string(),
        byte_size: 4,
        content_type: "image/jpeg".to_string(),
        uploaded_at,
    }
}

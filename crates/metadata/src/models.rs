//! Database models mapping to the quest schema.

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;
use wayquest_core::{QuestType, Region, PHOTO_OPTION_SENTINEL};

/// Quest definition scoped to a region.
///
/// Photo-mission quests carry [`PHOTO_OPTION_SENTINEL`] in all four option
/// slots and `correct_answer = "A"`; everything else is a multiple-choice
/// question quest.
#[derive(Debug, Clone, FromRow)]
pub struct QuestRow {
    pub quest_id: Uuid,
    pub city: String,
    pub town: Option<String>,
    pub village: Option<String>,
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    /// One of "A".."D".
    pub correct_answer: String,
    /// Nominal score weight (informational; awards are always 0/1).
    pub score: i32,
    pub created_at: OffsetDateTime,
}

impl QuestRow {
    /// Classify the quest by its option slots.
    pub fn quest_type(&self) -> QuestType {
        let photo = [
            &self.option_a,
            &self.option_b,
            &self.option_c,
            &self.option_d,
        ]
        .iter()
        .all(|o| o.as_str() == PHOTO_OPTION_SENTINEL);

        if photo {
            QuestType::Photo
        } else {
            QuestType::Question
        }
    }

    /// The quest's region tuple.
    pub fn region(&self) -> Region {
        Region::new(self.city.clone(), self.town.clone(), self.village.clone())
    }
}

/// One-time score ledger entry for a (user, quest) pair.
///
/// Region and question text are denormalized snapshots taken at answer time;
/// they never change even if the quest is later edited.
#[derive(Debug, Clone, FromRow)]
pub struct ScoreRecordRow {
    pub record_id: Uuid,
    pub user_id: String,
    pub quest_id: Uuid,
    pub city: String,
    pub town: Option<String>,
    pub village: Option<String>,
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    /// 1 if correct, 0 otherwise.
    pub awarded_score: i32,
    pub answered_at: OffsetDateTime,
}

impl ScoreRecordRow {
    /// The snapshotted region tuple.
    pub fn region(&self) -> Region {
        Region::new(self.city.clone(), self.town.clone(), self.village.clone())
    }
}

/// Uploaded media object record.
///
/// Multiple uploads per (user, quest) may exist; the most recent
/// `uploaded_at` is authoritative for media resolution. The record stores
/// only the storage key; display URLs are signed at read time, never
/// persisted.
#[derive(Debug, Clone, FromRow)]
pub struct UploadRecordRow {
    pub upload_id: Uuid,
    pub user_id: String,
    pub quest_id: Option<Uuid>,
    pub object_key: String,
    pub byte_size: i64,
    pub content_type: String,
    pub uploaded_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayquest_core::PHOTO_CORRECT_ANSWER;

    fn quest(options: [&str; 4]) -> QuestRow {
        QuestRow {
            quest_id: Uuid::new_v4(),
            city: "Jeju".to_string(),
            town: Some("Aewol".to_string()),
            village: None,
            question: "Find the lighthouse".to_string(),
            option_a: options[0].to_string(),
            option_b: options[1].to_string(),
            option_c: options[2].to_string(),
            option_d: options[3].to_string(),
            correct_answer: PHOTO_CORRECT_ANSWER.to_string(),
            score: 10,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn photo_quest_detected_by_sentinel() {
        let row = quest([PHOTO_OPTION_SENTINEL; 4]);
        assert_eq!(row.quest_type(), QuestType::Photo);
    }

    #[test]
    fn question_quest_with_distinct_options() {
        let row = quest(["a", "b", "c", "d"]);
        assert_eq!(row.quest_type(), QuestType::Question);
    }

    #[test]
    fn region_carries_supplied_levels() {
        let row = quest(["a", "b", "c", "d"]);
        let region = row.region();
        assert_eq!(region.city, "Jeju");
        assert_eq!(region.town.as_deref(), Some("Aewol"));
        assert_eq!(region.village, None);
    }
}

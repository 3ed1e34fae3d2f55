//! Quest types, answer handling, and the photo-mission sentinel values.

use crate::error::{Error, Result};

/// Option text stored in all four slots of a photo-mission quest.
pub const PHOTO_OPTION_SENTINEL: &str = "photo mission";

/// Fixed answer key recorded when a photo mission is completed.
pub const PHOTO_CORRECT_ANSWER: &str = "A";

/// The two quest flavors offered by the selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestType {
    /// Multiple-choice quest answered with one of the four option keys.
    Question,
    /// Quest fulfilled by uploading a photo; option slots hold the sentinel.
    Photo,
}

impl QuestType {
    /// The fallback type drawn when no quest of this type exists.
    pub fn opposite(self) -> Self {
        match self {
            Self::Question => Self::Photo,
            Self::Photo => Self::Question,
        }
    }

    /// Wire representation used in responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Photo => "photo",
        }
    }

    /// Classify a quest by its four option slots.
    ///
    /// Exactly one of two shapes is valid: all four slots carry the photo
    /// sentinel, or the four options are meaningfully distinct.
    pub fn classify(options: [&str; 4]) -> Result<Self> {
        if options.iter().all(|o| *o == PHOTO_OPTION_SENTINEL) {
            return Ok(Self::Photo);
        }
        for (i, a) in options.iter().enumerate() {
            if *a == PHOTO_OPTION_SENTINEL {
                return Err(Error::InvalidQuest(
                    "photo sentinel present in only some option slots".to_string(),
                ));
            }
            if options[i + 1..].contains(a) {
                return Err(Error::InvalidQuest(format!(
                    "duplicate option text: {a:?}"
                )));
            }
        }
        Ok(Self::Question)
    }
}

/// Normalize a submitted answer for storage and comparison.
///
/// Returns `None` when the submission is empty after trimming, which callers
/// treat as a missing required field.
pub fn normalize_answer(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_uppercase())
    }
}

/// Case-folded answer comparison: `"b"` and `"B"` are the same answer.
pub fn answers_match(user_answer: &str, correct_answer: &str) -> bool {
    user_answer.trim().eq_ignore_ascii_case(correct_answer.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_photo_quest() {
        let options = [PHOTO_OPTION_SENTINEL; 4];
        assert_eq!(QuestType::classify(options).unwrap(), QuestType::Photo);
    }

    #[test]
    fn classify_question_quest() {
        let options = ["Dol hareubang", "Haenyeo", "Hallasan", "Oreum"];
        assert_eq!(QuestType::classify(options).unwrap(), QuestType::Question);
    }

    #[test]
    fn classify_rejects_partial_sentinel() {
        let options = [PHOTO_OPTION_SENTINEL, "b", "c", "d"];
        assert!(QuestType::classify(options).is_err());
    }

    #[test]
    fn classify_rejects_duplicate_options() {
        let options = ["a", "b", "a", "d"];
        assert!(QuestType::classify(options).is_err());
    }

    #[test]
    fn answers_match_is_case_insensitive() {
        assert!(answers_match("b", "B"));
        assert!(answers_match(" C ", "c"));
        assert!(!answers_match("a", "B"));
    }

    #[test]
    fn normalize_answer_rejects_empty() {
        assert_eq!(normalize_answer("  "), None);
        assert_eq!(normalize_answer("c"), Some("C".to_string()));
    }
}

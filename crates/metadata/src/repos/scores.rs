//! Score ledger repository.

use crate::error::MetadataResult;
use crate::models::ScoreRecordRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for the write-once score ledger.
///
/// At most one record exists per (user_id, quest_id). The uniqueness
/// constraint in the store, not application logic, is the source of truth
/// for "first writer wins".
#[async_trait]
pub trait ScoreRepo: Send + Sync {
    /// Insert a score record unless one already exists for the pair.
    ///
    /// Returns `true` when the record was inserted, `false` when a prior
    /// record won. Zero rows affected is success, never an error; callers
    /// must not read-then-write to check existence first.
    async fn insert_score_if_absent(&self, record: &ScoreRecordRow) -> MetadataResult<bool>;

    /// Get the score record for a (user, quest) pair.
    async fn get_score(
        &self,
        user_id: &str,
        quest_id: Uuid,
    ) -> MetadataResult<Option<ScoreRecordRow>>;

    /// A user's full history, newest first.
    async fn list_scores_for_user(&self, user_id: &str) -> MetadataResult<Vec<ScoreRecordRow>>;
}

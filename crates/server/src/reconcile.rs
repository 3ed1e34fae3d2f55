//! Startup reconciliation of photo-mission uploads.
//!
//! Historical uploads may predate their score record (for example uploads
//! made while the score store was unreachable). This one-shot batch
//! synthesizes the missing records with the same sentinel values as the live
//! auto-scoring path, dated at the original upload time.

use crate::scoring::photo_score_record;
use wayquest_core::QuestType;
use wayquest_metadata::MetadataStore;

/// Outcome counters for a reconciliation run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Uploads with a quest reference that were examined.
    pub scanned: usize,
    /// Score records newly inserted.
    pub backfilled: usize,
    /// Individual records that failed; each is logged and skipped.
    pub errors: usize,
}

/// Backfill score records for photo-mission uploads that have none.
///
/// Safe to run repeatedly: the ledger's uniqueness constraint makes replays
/// no-ops. Individual failures never abort the run.
pub async fn reconcile_photo_scores(metadata: &dyn MetadataStore) -> ReconcileStats {
    let mut stats = ReconcileStats::default();

    let uploads = match metadata.list_uploads_with_quest().await {
        Ok(uploads) => uploads,
        Err(e) => {
            tracing::warn!(error = %e, "reconciliation could not list uploads, skipping");
            return stats;
        }
    };

    for upload in uploads {
        let Some(quest_id) = upload.quest_id else {
            continue;
        };
        stats.scanned += 1;

        let quest = match metadata.get_quest(quest_id).await {
            Ok(Some(quest)) => quest,
            Ok(None) => continue,
            Err(e) => {
                stats.errors += 1;
                tracing::warn!(
                    upload_id = %upload.upload_id,
                    quest_id = %quest_id,
                    error = %e,
                    "reconciliation could not load quest"
                );
                continue;
            }
        };

        if quest.quest_type() != QuestType::Photo {
            continue;
        }

        let record = photo_score_record(&quest, &upload.user_id, upload.uploaded_at);
        match metadata.insert_score_if_absent(&record).await {
            Ok(true) => {
                stats.backfilled += 1;
                tracing::info!(
                    user_id = %upload.user_id,
                    quest_id = %quest_id,
                    uploaded_at = %upload.uploaded_at,
                    "backfilled photo-mission score record"
                );
            }
            Ok(false) => {}
            Err(e) => {
                stats.errors += 1;
                tracing::warn!(
                    user_id = %upload.user_id,
                    quest_id = %quest_id,
                    error = %e,
                    "reconciliation insert failed"
                );
            }
        }
    }

    tracing::info!(
        scanned = stats.scanned,
        backfilled = stats.backfilled,
        errors = stats.errors,
        "photo-mission reconciliation finished"
    );
    stats
}

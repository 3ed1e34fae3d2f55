//! Integration tests for startup reconciliation of photo-mission uploads.

mod common;

use common::fixtures::{photo_quest, question_quest, upload_record};
use common::server::TestServer;
use time::OffsetDateTime;
use wayquest_core::PHOTO_CORRECT_ANSWER;
use wayquest_metadata::MetadataStore;
use wayquest_server::reconcile::reconcile_photo_scores;
use wayquest_server::scoring::photo_score_record;

#[tokio::test]
async fn backfills_scores_for_historical_photo_uploads() {
    let server = TestServer::new().await;
    let quest = photo_quest("Jeju", None, None);
    server.seed_quest(&quest).await;

    let uploaded_at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
    server
        .metadata()
        .create_upload(&upload_record(
            "user-1",
            Some(quest.quest_id),
            "uploads/user-1/old.jpg",
            uploaded_at,
        ))
        .await
        .unwrap();

    let stats = reconcile_photo_scores(server.metadata().as_ref()).await;
    assert_eq!(stats.scanned, 1);
    assert_eq!(stats.backfilled, 1);
    assert_eq!(stats.errors, 0);

    let record = server
        .metadata()
        .get_score("user-1", quest.quest_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.user_answer, PHOTO_CORRECT_ANSWER);
    assert_eq!(record.awarded_score, 1);
    // The backfilled record is dated at the original upload time.
    assert_eq!(record.answered_at, uploaded_at);
}

#[tokio::test]
async fn reconciliation_is_idempotent() {
    let server = TestServer::new().await;
    let quest = photo_quest("Jeju", None, None);
    server.seed_quest(&quest).await;
    server
        .metadata()
        .create_upload(&upload_record(
            "user-1",
            Some(quest.quest_id),
            "uploads/user-1/old.jpg",
            OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
        ))
        .await
        .unwrap();

    let first = reconcile_photo_scores(server.metadata().as_ref()).await;
    assert_eq!(first.backfilled, 1);

    let second = reconcile_photo_scores(server.metadata().as_ref()).await;
    assert_eq!(second.backfilled, 0);
    assert_eq!(second.errors, 0);

    let history = server.metadata().list_scores_for_user("user-1").await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn skips_question_quests_and_already_scored_uploads() {
    let server = TestServer::new().await;

    let question = question_quest("Jeju", None, None);
    server.seed_quest(&question).await;
    server
        .metadata()
        .create_upload(&upload_record(
            "user-1",
            Some(question.quest_id),
            "uploads/user-1/a.jpg",
            OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
        ))
        .await
        .unwrap();

    let photo = photo_quest("Jeju", None, None);
    server.seed_quest(&photo).await;
    server
        .metadata()
        .create_upload(&upload_record(
            "user-2",
            Some(photo.quest_id),
            "uploads/user-2/b.jpg",
            OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
        ))
        .await
        .unwrap();

    // user-2 was already scored by the live path.
    let live = photo_score_record(&photo, "user-2", OffsetDateTime::now_utc());
    assert!(server
        .metadata()
        .insert_score_if_absent(&live)
        .await
        .unwrap());

    let stats = reconcile_photo_scores(server.metadata().as_ref()).await;
    assert_eq!(stats.scanned, 2);
    assert_eq!(stats.backfilled, 0);
    assert_eq!(stats.errors, 0);

    // No record was synthesized for the question quest.
    assert!(server
        .metadata()
        .get_score("user-1", question.quest_id)
        .await
        .unwrap()
        .is_none());

    // The live record was left untouched.
    let stored = server
        .metadata()
        .get_score("user-2", photo.quest_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.record_id, live.record_id);
}

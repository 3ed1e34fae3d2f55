//! Integration tests for quest selection.

mod common;

use axum::http::StatusCode;
use common::fixtures::{photo_quest, question_quest};
use common::server::{json_request, TestServer};
use std::collections::HashSet;
use uuid::Uuid;

#[tokio::test]
async fn random_quest_requires_city() {
    let server = TestServer::new().await;

    let (status, body) = json_request(&server.router, "GET", "/quests/random", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn random_quest_matches_region_filter() {
    let server = TestServer::new().await;
    let aewol = question_quest("Jeju", Some("Aewol"), None);
    server.seed_quest(&aewol).await;
    server
        .seed_quest(&question_quest("Jeju", Some("Seogwipo"), None))
        .await;
    server.seed_quest(&question_quest("Busan", None, None)).await;

    for _ in 0..20 {
        let (status, body) = json_request(
            &server.router,
            "GET",
            "/quests/random?city=Jeju&town=Aewol",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], aewol.quest_id.to_string());
        assert_eq!(body["region"], "Jeju Aewol");
    }
}

#[tokio::test]
async fn question_only_region_never_returns_photo() {
    let server = TestServer::new().await;
    let mut ids = HashSet::new();
    for _ in 0..5 {
        let quest = question_quest("Jeju", Some("Aewol"), Some("Woljeong"));
        ids.insert(quest.quest_id.to_string());
        server.seed_quest(&quest).await;
    }

    for _ in 0..100 {
        let (status, body) = json_request(
            &server.router,
            "GET",
            "/quests/random?city=Jeju&town=Aewol&village=Woljeong",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "question");
        assert!(ids.contains(body["id"].as_str().unwrap()));

        // Question quests expose four options but never the correct answer.
        assert!(body["options"]["A"].is_string());
        assert!(body["options"]["D"].is_string());
        assert!(body.get("correctAnswer").is_none());
        assert!(body.get("instruction").is_none());
    }
}

#[tokio::test]
async fn photo_only_region_always_returns_photo_body() {
    let server = TestServer::new().await;
    server.seed_quest(&photo_quest("Jeju", None, None)).await;

    for _ in 0..20 {
        let (status, body) =
            json_request(&server.router, "GET", "/quests/random?city=Jeju", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "photo");
        assert_eq!(body["uploadEndpoint"], "/uploads");
        assert!(body["instruction"].is_string());
        assert!(body.get("options").is_none());
        assert!(body.get("question").is_none());
    }
}

#[tokio::test]
async fn mixed_region_offers_both_types() {
    let server = TestServer::new().await;
    server.seed_quest(&photo_quest("Jeju", None, None)).await;
    for _ in 0..9 {
        server.seed_quest(&question_quest("Jeju", None, None)).await;
    }

    // The draw is on requested type, not quest population: over enough
    // requests both types must appear despite the 9:1 imbalance.
    let mut seen = HashSet::new();
    for _ in 0..200 {
        let (status, body) =
            json_request(&server.router, "GET", "/quests/random?city=Jeju", None).await;
        assert_eq!(status, StatusCode::OK);
        seen.insert(body["type"].as_str().unwrap().to_string());
        if seen.len() == 2 {
            break;
        }
    }
    assert_eq!(seen.len(), 2, "expected both quest types, saw {seen:?}");
}

#[tokio::test]
async fn empty_region_is_not_found_with_diagnostics() {
    let server = TestServer::new().await;
    server
        .seed_quest(&question_quest("Jeju", Some("Aewol"), None))
        .await;

    let (status, body) =
        json_request(&server.router, "GET", "/quests/random?city=Busan", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Busan"));
    // The diagnostic lists regions that do have quests.
    assert!(message.contains("Jeju Aewol"));
}

#[tokio::test]
async fn region_matching_is_exact_no_case_folding() {
    let server = TestServer::new().await;
    server.seed_quest(&question_quest("Jeju", None, None)).await;

    let (status, _) =
        json_request(&server.router, "GET", "/quests/random?city=jeju", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn check_unknown_quest_is_not_found() {
    let server = TestServer::new().await;
    let (status, body) = json_request(
        &server.router,
        "POST",
        &format!("/quests/{}/check", Uuid::new_v4()),
        Some(serde_json::json!({"answer": "A"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn health_reports_ok() {
    let server = TestServer::new().await;
    let (status, body) = json_request(&server.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

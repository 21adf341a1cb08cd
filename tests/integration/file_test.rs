//! Integration tests for the file lifecycle: upload provisioning, the
//! blob upload proxy, completion, downloads, and payload maintenance.

use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use verdant_storage::UploadToken;

use crate::helpers::{TestApp, TestResponse, unique_name};

async fn provision(app: &TestApp, token: &str, file_name: &str, size: i64) -> TestResponse {
    app.request(
        "POST",
        "/api/files",
        Some(json!({
            "parent_id": null,
            "file_name": file_name,
            "mime_type": "text/plain",
            "file_size": size,
        })),
        Some(token),
    )
    .await
}

fn node_id(created: &TestResponse) -> Uuid {
    created.body["data"]["node"]["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap()
}

fn storage_key(created: &TestResponse) -> String {
    created.body["data"]["payload"]["storage_key"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn upload_lifecycle_pending_to_ready_to_download() {
    let app = TestApp::new().await;
    let username = unique_name("uploader");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;
    let token = app.login(&username, "Sunlit!Meadow42").await;

    let bytes = b"seasonal planting schedule".to_vec();
    let created = provision(&app, &token, "Planting Schedule.txt", bytes.len() as i64).await;
    assert_eq!(created.status, StatusCode::OK, "{:?}", created.body);

    let payload = &created.body["data"]["payload"];
    assert_eq!(payload["upload_status"].as_str(), Some("pending"));
    assert_eq!(payload["storage_provider"].as_str(), Some("object_storage"));

    let credential = &created.body["data"]["credential"];
    assert_eq!(credential["method"].as_str(), Some("PUT"));
    assert!(credential["url"].as_str().unwrap().contains("upload"));
    assert!(credential["expires_at"].as_str().is_some());

    let id = node_id(&created);
    let key = storage_key(&created);

    // Completing before any bytes reach the backend is rejected.
    let premature = app
        .request(
            "POST",
            &format!("/api/files/{id}/complete"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(premature.status, StatusCode::BAD_REQUEST);

    // The download URL is also gated on readiness.
    let early_url = app
        .request(
            "GET",
            &format!("/api/files/{id}/download-url"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(early_url.status, StatusCode::BAD_REQUEST);

    // Simulate the client's direct PUT against the backend.
    app.storage.insert(&key, bytes.clone(), "text/plain");

    let completed = app
        .request(
            "POST",
            &format!("/api/files/{id}/complete"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(completed.status, StatusCode::OK, "{:?}", completed.body);
    assert_eq!(
        completed.body["data"]["upload_status"].as_str(),
        Some("ready")
    );
    // Size comes from the backend probe, not the client's declaration.
    assert_eq!(
        completed.body["data"]["file_size"].as_i64(),
        Some(bytes.len() as i64)
    );

    // Completion is idempotent.
    let again = app
        .request(
            "POST",
            &format!("/api/files/{id}/complete"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(again.status, StatusCode::OK);

    let url = app
        .request(
            "GET",
            &format!("/api/files/{id}/download-url"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(url.status, StatusCode::OK);
    assert!(url.body["data"]["url"].as_str().unwrap().contains(&key));

    // The streaming download returns the exact stored bytes.
    let (status, headers, body) = app
        .request_raw("GET", &format!("/api/files/{id}/download"), None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("text/plain")
    );
    let disposition = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(disposition.starts_with("attachment"), "{disposition}");
    assert_eq!(body.to_vec(), bytes);

    // Deleting the node releases the stored object.
    let deleted = app
        .request("DELETE", &format!("/api/content/{id}"), None, Some(&token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert!(deleted.body["data"]["count"].as_u64().unwrap() >= 1);
    assert!(!app.storage.has_key(&key));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn proxy_upload_round_trips_bytes() {
    let app = TestApp::new().await;
    let username = unique_name("proxy");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;
    let auth = app.login(&username, "Sunlit!Meadow42").await;

    let body = Value::String("compost ratios by season".to_string());
    let raw = serde_json::to_vec(&body).unwrap();

    let created = provision(&app, &auth, "compost.txt", raw.len() as i64).await;
    assert_eq!(created.status, StatusCode::OK);
    let id = node_id(&created);
    let key = storage_key(&created);

    // The proxy route is token-authenticated, not session-authenticated.
    let token = UploadToken::new(&key, "text/plain", Utc::now() + Duration::minutes(15))
        .encode()
        .unwrap();
    let (status, _headers, _body) = app
        .request_raw(
            "PUT",
            &format!("/api/files/proxy?token={token}"),
            Some(body),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.storage.contents(&key), Some(raw.clone()));

    let completed = app
        .request("POST", &format!("/api/files/{id}/complete"), None, Some(&auth))
        .await;
    assert_eq!(completed.status, StatusCode::OK);
    assert_eq!(
        completed.body["data"]["file_size"].as_i64(),
        Some(raw.len() as i64)
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn proxy_upload_rejects_bad_tokens() {
    let app = TestApp::new().await;
    let username = unique_name("forger");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;
    let auth = app.login(&username, "Sunlit!Meadow42").await;

    // Garbage that never decodes.
    let (status, _, _) = app
        .request_raw("PUT", "/api/files/proxy?token=not-a-token", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Well-formed but expired.
    let expired = UploadToken::new("files/x/y.txt", "text/plain", Utc::now() - Duration::seconds(5))
        .encode()
        .unwrap();
    let (status, _, _) = app
        .request_raw("PUT", &format!("/api/files/proxy?token={expired}"), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Well-formed but pointing at a key no pending upload claims: this
    // is what a forged token buys — nothing.
    let forged = UploadToken::new(
        "files/forged/secret.txt",
        "text/plain",
        Utc::now() + Duration::minutes(15),
    )
    .encode()
    .unwrap();
    let (status, _, _) = app
        .request_raw("PUT", &format!("/api/files/proxy?token={forged}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A token whose MIME type disagrees with the pending payload.
    let created = provision(&app, &auth, "notes.txt", 16).await;
    let key = storage_key(&created);
    let wrong_mime = UploadToken::new(&key, "application/pdf", Utc::now() + Duration::minutes(15))
        .encode()
        .unwrap();
    let (status, _, _) = app
        .request_raw(
            "PUT",
            &format!("/api/files/proxy?token={wrong_mime}"),
            Some(Value::String("x".to_string())),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!app.storage.has_key(&key));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn clear_external_link_removes_only_the_drive_entry() {
    let app = TestApp::new().await;
    let username = unique_name("linked");
    let owner_id = app
        .create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;
    let token = app.login(&username, "Sunlit!Meadow42").await;

    let bytes = b"linked document".to_vec();
    let created = provision(&app, &token, "linked.txt", bytes.len() as i64).await;
    let id = node_id(&created);
    let key = storage_key(&created);
    app.storage.insert(&key, bytes, "text/plain");
    app.request("POST", &format!("/api/files/{id}/complete"), None, Some(&token))
        .await;

    // Seed a legacy external link the way the old importer left them.
    sqlx::query(
        "UPDATE file_payloads SET storage_metadata = \
         '{\"externalProviders\": {\"googleDrive\": \"gd-1a2b3c\"}}'::jsonb \
         WHERE content_id = $1",
    )
    .bind(id)
    .execute(&app.db_pool)
    .await
    .unwrap();

    let cleared = app
        .request(
            "DELETE",
            &format!("/api/files/{id}/external-link"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(cleared.status, StatusCode::OK, "{:?}", cleared.body);
    assert!(
        cleared.body["data"]["storage_metadata"]
            .get("externalProviders")
            .is_none()
    );

    // Clearing again is a no-op, not an error.
    let again = app
        .request(
            "DELETE",
            &format!("/api/files/{id}/external-link"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(again.status, StatusCode::OK);

    let audited: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_log \
         WHERE action = 'file.clear_external_link' AND actor_id = $1",
    )
    .bind(owner_id)
    .fetch_one(&app.db_pool)
    .await
    .unwrap();
    assert_eq!(audited, 1);
}

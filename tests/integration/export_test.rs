//! Integration tests for vault export.

use std::io::{Cursor, Read};

use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde_json::{Value, json};
use uuid::Uuid;
use zip::ZipArchive;

use crate::helpers::{TestApp, unique_name};

async fn export(app: &TestApp, token: &str) -> ZipArchive<Cursor<Vec<u8>>> {
    let (status, headers, bytes) = app
        .request_raw("POST", "/api/export/vault", None, Some(token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("application/zip")
    );
    ZipArchive::new(Cursor::new(bytes.to_vec())).expect("Response is not a ZIP archive")
}

fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Value {
    let mut text = String::new();
    archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("Archive is missing entry {name}"))
        .read_to_string(&mut text)
        .unwrap();
    serde_json::from_str(&text).unwrap()
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn export_packages_notes_by_path() {
    let app = TestApp::new().await;
    let username = unique_name("archivist");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;
    let token = app.login(&username, "Sunlit!Meadow42").await;

    let folder = app
        .request(
            "POST",
            "/api/content/folders",
            Some(json!({ "title": "Projects" })),
            Some(&token),
        )
        .await
        .body["data"]["id"]
        .clone();
    let note = app
        .request(
            "POST",
            "/api/content/notes",
            Some(json!({ "title": "Roadmap", "parent_id": folder })),
            Some(&token),
        )
        .await
        .body["data"]["id"]
        .clone();
    app.request(
        "PUT",
        &format!("/api/content/{}/body", note.as_str().unwrap()),
        Some(json!({ "body": { "type": "doc", "content": [] } })),
        Some(&token),
    )
    .await;

    let (status, headers, bytes) = app
        .request_raw("POST", "/api/export/vault", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let disposition = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(disposition.starts_with("attachment"), "{disposition}");
    assert!(disposition.contains("verdant-export-"), "{disposition}");

    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let body = read_entry(&mut archive, "projects/roadmap.json");
    assert_eq!(body["type"].as_str(), Some("doc"));

    let manifest = read_entry(&mut archive, "manifest.json");
    assert_eq!(manifest["username"].as_str(), Some(username.as_str()));
    assert_eq!(manifest["notes"].as_u64(), Some(1));

    // The export is recorded in the audit trail.
    let audited: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_log WHERE action = 'export.vault' AND actor_id = \
         (SELECT id FROM users WHERE username = $1)",
    )
    .bind(&username)
    .fetch_one(&app.db_pool)
    .await
    .unwrap();
    assert_eq!(audited, 1);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn trash_is_exported_only_when_enabled() {
    let app = TestApp::new().await;
    let username = unique_name("archivist");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;
    let token = app.login(&username, "Sunlit!Meadow42").await;

    app.request(
        "POST",
        "/api/content/notes",
        Some(json!({ "title": "Keep" })),
        Some(&token),
    )
    .await;
    let gone = app
        .request(
            "POST",
            "/api/content/notes",
            Some(json!({ "title": "Gone" })),
            Some(&token),
        )
        .await
        .body["data"]["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap();
    app.request("DELETE", &format!("/api/content/{gone}"), None, Some(&token))
        .await;

    let archive = export(&app, &token).await;
    assert!(
        !archive.file_names().any(|n| n.starts_with("trash/")),
        "Default export must not contain trash"
    );

    app.request(
        "PATCH",
        "/api/settings",
        Some(json!({ "export": { "include_deleted": true } })),
        Some(&token),
    )
    .await;

    let mut archive = export(&app, &token).await;
    read_entry(&mut archive, "trash/gone.json");
    let manifest = read_entry(&mut archive, "manifest.json");
    assert_eq!(manifest["trashed"].as_u64(), Some(1));
    assert_eq!(manifest["notes"].as_u64(), Some(1));
}

//! Integration tests for the admin panel: user management and the
//! audit trail.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{TestApp, unique_name};

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn admin_surface_is_closed_to_members() {
    let app = TestApp::new().await;
    let username = unique_name("member");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;
    let token = app.login(&username, "Sunlit!Meadow42").await;

    for (method, path) in [
        ("GET", "/api/admin/users"),
        ("GET", "/api/admin/audit"),
        ("GET", "/api/admin/audit/recent"),
        ("GET", "/api/admin/audit/dashboard"),
        ("POST", "/api/admin/paths/rebuild"),
    ] {
        let response = app.request(method, path, None, Some(&token)).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{method} {path}");
        assert_eq!(response.body["error"].as_str(), Some("FORBIDDEN"));
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn admin_creates_a_user_with_a_temporary_password() {
    let app = TestApp::new().await;
    let admin = unique_name("admin");
    app.create_test_user(&admin, "Sunlit!Meadow42", "admin").await;
    let token = app.login(&admin, "Sunlit!Meadow42").await;

    let new_username = unique_name("sprout");
    let response = app
        .request(
            "POST",
            "/api/admin/users",
            Some(json!({
                "username": new_username,
                "email": format!("{new_username}@example.com"),
                "display_name": "Sprout",
                "role": "member",
                "password": null,
            })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let data = &response.body["data"];
    assert_eq!(
        data["user"]["username"].as_str(),
        Some(new_username.as_str())
    );
    let temp_password = data["temporary_password"]
        .as_str()
        .expect("A generated password is returned once")
        .to_string();

    // The generated credential works immediately.
    let login = app.login(&new_username, &temp_password).await;
    assert!(!login.is_empty());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn role_and_status_changes_take_effect() {
    let app = TestApp::new().await;
    let admin = unique_name("admin");
    app.create_test_user(&admin, "Sunlit!Meadow42", "admin").await;
    let token = app.login(&admin, "Sunlit!Meadow42").await;

    let target = unique_name("target");
    let target_id = app
        .create_test_user(&target, "Sunlit!Meadow42", "member")
        .await;

    let response = app
        .request(
            "PUT",
            &format!("/api/admin/users/{target_id}/role"),
            Some(json!({ "role": "admin" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["role"].as_str(), Some("admin"));

    // The promoted user can reach the admin surface.
    let target_token = app.login(&target, "Sunlit!Meadow42").await;
    let response = app
        .request("GET", "/api/admin/audit/recent", None, Some(&target_token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // Disabling blocks future logins.
    let response = app
        .request(
            "PUT",
            &format!("/api/admin/users/{target_id}/status"),
            Some(json!({ "status": "disabled" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": target, "password": "Sunlit!Meadow42" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn mutations_show_up_in_the_audit_trail() {
    let app = TestApp::new().await;
    let admin = unique_name("auditor");
    app.create_test_user(&admin, "Sunlit!Meadow42", "admin").await;
    let token = app.login(&admin, "Sunlit!Meadow42").await;

    let note = app
        .request(
            "POST",
            "/api/content/notes",
            Some(json!({ "parent_id": null, "title": "Audited", "body": null })),
            Some(&token),
        )
        .await;
    let note_id = note.body["data"]["id"].as_str().unwrap().to_string();

    app.request("DELETE", &format!("/api/content/{note_id}"), None, Some(&token))
        .await;

    let response = app
        .request(
            "GET",
            "/api/admin/audit?action=content.delete&page_size=100",
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let items = response.body["data"]["items"].as_array().unwrap();
    assert!(
        items.iter().any(|e| {
            e["target_content_id"].as_str() == Some(note_id.as_str())
                && e["action"].as_str() == Some("content.delete")
        }),
        "content.delete entry for the trashed note is missing"
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn admin_terminates_another_users_session() {
    let app = TestApp::new().await;
    let admin = unique_name("admin");
    app.create_test_user(&admin, "Sunlit!Meadow42", "admin").await;
    let admin_token = app.login(&admin, "Sunlit!Meadow42").await;

    let target = unique_name("target");
    app.create_test_user(&target, "Sunlit!Meadow42", "member")
        .await;
    let target_token = app.login(&target, "Sunlit!Meadow42").await;

    let sessions = app
        .request("GET", "/api/auth/sessions", None, Some(&target_token))
        .await;
    let session_id = sessions.body["data"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "POST",
            &format!("/api/admin/sessions/{session_id}/terminate"),
            Some(json!({ "reason": "suspicious activity" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("GET", "/api/auth/me", None, Some(&target_token))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn path_rebuild_reports_the_rebuilt_count() {
    let app = TestApp::new().await;
    let admin = unique_name("admin");
    app.create_test_user(&admin, "Sunlit!Meadow42", "admin").await;
    let token = app.login(&admin, "Sunlit!Meadow42").await;

    app.request(
        "POST",
        "/api/content/notes",
        Some(json!({ "parent_id": null, "title": "Rooted", "body": null })),
        Some(&token),
    )
    .await;

    let response = app
        .request("POST", "/api/admin/paths/rebuild", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"]["count"].as_u64().unwrap() >= 1);
}

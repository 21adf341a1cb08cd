//! Integration tests for the per-user settings document.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{TestApp, unique_name};

async fn member(app: &TestApp) -> String {
    let username = unique_name("prefs");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;
    app.login(&username, "Sunlit!Meadow42").await
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn new_users_get_default_settings() {
    let app = TestApp::new().await;
    let token = member(&app).await;

    let response = app.request("GET", "/api/settings", None, Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["theme"].as_str(), Some("system"));
    assert_eq!(data["editor"]["font_size"].as_u64(), Some(14));
    assert_eq!(data["editor"]["show_outline"].as_bool(), Some(true));
    assert_eq!(data["export"]["include_files"].as_bool(), Some(true));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn patch_merges_nested_objects() {
    let app = TestApp::new().await;
    let token = member(&app).await;

    let response = app
        .request(
            "PATCH",
            "/api/settings",
            Some(json!({
                "theme": "dark",
                "editor": { "font_size": 16 },
            })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let data = &response.body["data"];
    assert_eq!(data["theme"].as_str(), Some("dark"));
    assert_eq!(data["editor"]["font_size"].as_u64(), Some(16));
    // Untouched nested keys keep their values.
    assert_eq!(data["editor"]["show_outline"].as_bool(), Some(true));

    // A null value clears the key back to its default.
    let response = app
        .request(
            "PATCH",
            "/api/settings",
            Some(json!({ "theme": null })),
            Some(&token),
        )
        .await;
    assert_eq!(response.body["data"]["theme"].as_str(), Some("system"));
    assert_eq!(
        response.body["data"]["editor"]["font_size"].as_u64(),
        Some(16)
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn unknown_keys_are_rejected() {
    let app = TestApp::new().await;
    let token = member(&app).await;

    let response = app
        .request(
            "PATCH",
            "/api/settings",
            Some(json!({ "sidebar_width": 300 })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "PATCH",
            "/api/settings",
            Some(json!({ "editor": { "vim_mode": true } })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn reset_reverts_to_defaults() {
    let app = TestApp::new().await;
    let token = member(&app).await;

    app.request(
        "PATCH",
        "/api/settings",
        Some(json!({ "theme": "light", "locale": "de-DE" })),
        Some(&token),
    )
    .await;

    let response = app
        .request("DELETE", "/api/settings", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["theme"].as_str(), Some("system"));

    let response = app.request("GET", "/api/settings", None, Some(&token)).await;
    assert_eq!(response.body["data"]["locale"].as_str(), Some(""));
}

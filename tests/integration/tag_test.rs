//! Integration tests for tagging.

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::helpers::{TestApp, unique_name};

async fn writer(app: &TestApp) -> String {
    let username = unique_name("tagger");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;
    app.login(&username, "Sunlit!Meadow42").await
}

async fn create_note(app: &TestApp, token: &str, title: &str) -> Uuid {
    let response = app
        .request(
            "POST",
            "/api/content/notes",
            Some(json!({ "title": title })),
            Some(token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    response.body["data"]["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap()
}

async fn set_tags(app: &TestApp, token: &str, note: Uuid, tags: serde_json::Value) {
    let response = app
        .request(
            "PUT",
            &format!("/api/content/{note}/tags"),
            Some(json!({ "tags": tags })),
            Some(token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn tag_names_are_normalized_and_deduplicated() {
    let app = TestApp::new().await;
    let token = writer(&app).await;
    let note = create_note(&app, &token, "Tagged note").await;

    let response = app
        .request(
            "PUT",
            &format!("/api/content/{note}/tags"),
            Some(json!({
                "tags": [
                    { "name": "  Rust ", "positions": [{ "start": 0, "end": 5 }] },
                    { "name": "RUST" },
                    { "name": "" },
                ],
            })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let applied = response.body["data"].as_array().unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0]["name"].as_str(), Some("rust"));

    // The first occurrence's positions stick.
    let response = app
        .request(
            "GET",
            &format!("/api/content/{note}/tags"),
            None,
            Some(&token),
        )
        .await;
    let attached = response.body["data"].as_array().unwrap();
    assert_eq!(attached.len(), 1);
    assert_eq!(attached[0]["tag"]["name"].as_str(), Some("rust"));
    assert_eq!(attached[0]["positions"][0]["end"].as_u64(), Some(5));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn tag_listing_counts_live_nodes() {
    let app = TestApp::new().await;
    let token = writer(&app).await;
    let first = create_note(&app, &token, "First").await;
    let second = create_note(&app, &token, "Second").await;

    set_tags(
        &app,
        &token,
        first,
        json!([{ "name": "garden" }, { "name": "rust" }]),
    )
    .await;
    set_tags(&app, &token, second, json!([{ "name": "rust" }])).await;

    let response = app.request("GET", "/api/tags", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    let tags = response.body["data"].as_array().unwrap();
    let count_of = |name: &str| {
        tags.iter()
            .find(|t| t["name"].as_str() == Some(name))
            .and_then(|t| t["content_count"].as_i64())
    };
    assert_eq!(count_of("rust"), Some(2));
    assert_eq!(count_of("garden"), Some(1));

    let response = app
        .request("GET", "/api/tags/rust/content", None, Some(&token))
        .await;
    assert_eq!(response.body["data"].as_array().unwrap().len(), 2);

    // Trashing a node drops it from tag counts and lookups.
    app.request(
        "DELETE",
        &format!("/api/content/{second}"),
        None,
        Some(&token),
    )
    .await;
    let response = app.request("GET", "/api/tags", None, Some(&token)).await;
    let tags = response.body["data"].as_array().unwrap();
    let rust = tags
        .iter()
        .find(|t| t["name"].as_str() == Some("rust"))
        .unwrap();
    assert_eq!(rust["content_count"].as_i64(), Some(1));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn replacing_tags_prunes_unused_names() {
    let app = TestApp::new().await;
    let token = writer(&app).await;
    let note = create_note(&app, &token, "Draft").await;

    set_tags(&app, &token, note, json!([{ "name": "draft" }])).await;
    set_tags(&app, &token, note, json!([{ "name": "published" }])).await;

    let response = app.request("GET", "/api/tags", None, Some(&token)).await;
    let names: Vec<&str> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert!(names.contains(&"published"));
    assert!(!names.contains(&"draft"));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn tags_are_scoped_to_their_owner() {
    let app = TestApp::new().await;
    let alice = writer(&app).await;
    let bob = writer(&app).await;
    let note = create_note(&app, &alice, "Alice's note").await;
    set_tags(&app, &alice, note, json!([{ "name": "secret" }])).await;

    // Bob cannot tag or read tags on Alice's node.
    let response = app
        .request(
            "PUT",
            &format!("/api/content/{note}/tags"),
            Some(json!({ "tags": [{ "name": "graffiti" }] })),
            Some(&bob),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Bob's tag listing does not include Alice's names.
    let response = app.request("GET", "/api/tags", None, Some(&bob)).await;
    assert_eq!(response.body["data"].as_array().unwrap().len(), 0);
}

//! Integration tests for the content tree: notes, folders, slugs,
//! materialized paths, and the trash lifecycle.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{TestApp, unique_name};

async fn writer(app: &TestApp) -> String {
    let username = unique_name("garden");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;
    app.login(&username, "Sunlit!Meadow42").await
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn create_note_slugifies_the_title() {
    let app = TestApp::new().await;
    let token = writer(&app).await;

    let response = app
        .request(
            "POST",
            "/api/content/notes",
            Some(json!({
                "parent_id": null,
                "title": "Hello, Wörld & Friends!",
                "body": null,
            })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let node = &response.body["data"];
    assert_eq!(node["kind"].as_str(), Some("note"));
    assert_eq!(node["slug"].as_str(), Some("hello-wrld-friends"));
    assert_eq!(node["display_order"].as_i64(), Some(0));
    assert!(node["parent_id"].is_null());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn duplicate_titles_get_numbered_slugs() {
    let app = TestApp::new().await;
    let token = writer(&app).await;

    let mut slugs = Vec::new();
    for _ in 0..3 {
        let response = app
            .request(
                "POST",
                "/api/content/notes",
                Some(json!({ "parent_id": null, "title": "Reading List", "body": null })),
                Some(&token),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        slugs.push(response.body["data"]["slug"].as_str().unwrap().to_string());
    }

    assert_eq!(slugs[0], "reading-list");
    assert_eq!(slugs[1], "reading-list-2");
    assert_eq!(slugs[2], "reading-list-3");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn nested_nodes_resolve_by_path() {
    let app = TestApp::new().await;
    let token = writer(&app).await;

    let folder = app
        .request(
            "POST",
            "/api/content/folders",
            Some(json!({ "parent_id": null, "title": "Projects" })),
            Some(&token),
        )
        .await;
    let folder_id = folder.body["data"]["id"].as_str().unwrap().to_string();

    let note = app
        .request(
            "POST",
            "/api/content/notes",
            Some(json!({ "parent_id": folder_id, "title": "Roadmap", "body": null })),
            Some(&token),
        )
        .await;
    let note_id = note.body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "GET",
            "/api/content/by-path?path=projects/roadmap",
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["id"].as_str(), Some(note_id.as_str()));

    let breadcrumb = app
        .request(
            "GET",
            &format!("/api/content/{note_id}/breadcrumb"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(breadcrumb.status, StatusCode::OK);
    assert_eq!(
        breadcrumb.body["data"]["path"].as_str(),
        Some("projects/roadmap")
    );
    assert_eq!(breadcrumb.body["data"]["depth"].as_i64(), Some(1));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn rename_updates_slug_and_descendant_paths() {
    let app = TestApp::new().await;
    let token = writer(&app).await;

    let folder = app
        .request(
            "POST",
            "/api/content/folders",
            Some(json!({ "parent_id": null, "title": "Drafts" })),
            Some(&token),
        )
        .await;
    let folder_id = folder.body["data"]["id"].as_str().unwrap().to_string();

    let note = app
        .request(
            "POST",
            "/api/content/notes",
            Some(json!({ "parent_id": folder_id, "title": "Ideas", "body": null })),
            Some(&token),
        )
        .await;
    let note_id = note.body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "PUT",
            &format!("/api/content/{folder_id}/rename"),
            Some(json!({ "title": "Published" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["slug"].as_str(), Some("published"));

    // The child's cached path follows the renamed ancestor.
    let breadcrumb = app
        .request(
            "GET",
            &format!("/api/content/{note_id}/breadcrumb"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(
        breadcrumb.body["data"]["path"].as_str(),
        Some("published/ideas")
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn move_rejects_cycles_but_allows_nesting_under_notes() {
    let app = TestApp::new().await;
    let token = writer(&app).await;

    let outer = app
        .request(
            "POST",
            "/api/content/folders",
            Some(json!({ "parent_id": null, "title": "Outer" })),
            Some(&token),
        )
        .await;
    let outer_id = outer.body["data"]["id"].as_str().unwrap().to_string();

    let inner = app
        .request(
            "POST",
            "/api/content/folders",
            Some(json!({ "parent_id": outer_id, "title": "Inner" })),
            Some(&token),
        )
        .await;
    let inner_id = inner.body["data"]["id"].as_str().unwrap().to_string();

    let note = app
        .request(
            "POST",
            "/api/content/notes",
            Some(json!({ "parent_id": null, "title": "Hub", "body": null })),
            Some(&token),
        )
        .await;
    let note_id = note.body["data"]["id"].as_str().unwrap().to_string();

    // A folder cannot move into itself or under its own descendant.
    let response = app
        .request(
            "PUT",
            &format!("/api/content/{outer_id}/move"),
            Some(json!({ "parent_id": outer_id })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "PUT",
            &format!("/api/content/{outer_id}/move"),
            Some(json!({ "parent_id": inner_id })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // Notes nest like folders do.
    let response = app
        .request(
            "PUT",
            &format!("/api/content/{inner_id}/move"),
            Some(json!({ "parent_id": note_id })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(
        response.body["data"]["parent_id"].as_str(),
        Some(note_id.as_str())
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn users_cannot_touch_each_others_content() {
    let app = TestApp::new().await;
    let alice = writer(&app).await;
    let bob = writer(&app).await;

    let note = app
        .request(
            "POST",
            "/api/content/notes",
            Some(json!({ "parent_id": null, "title": "Private", "body": null })),
            Some(&alice),
        )
        .await;
    let note_id = note.body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request("GET", &format!("/api/content/{note_id}"), None, Some(&bob))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            "PUT",
            &format!("/api/content/{note_id}/rename"),
            Some(json!({ "title": "Mine Now" })),
            Some(&bob),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn trash_restore_and_purge_lifecycle() {
    let app = TestApp::new().await;
    let token = writer(&app).await;

    let folder = app
        .request(
            "POST",
            "/api/content/folders",
            Some(json!({ "parent_id": null, "title": "Archive" })),
            Some(&token),
        )
        .await;
    let folder_id = folder.body["data"]["id"].as_str().unwrap().to_string();

    let note = app
        .request(
            "POST",
            "/api/content/notes",
            Some(json!({ "parent_id": folder_id, "title": "Old Note", "body": null })),
            Some(&token),
        )
        .await;
    let note_id = note.body["data"]["id"].as_str().unwrap().to_string();

    // Deleting the folder trashes the whole subtree.
    let response = app
        .request("DELETE", &format!("/api/content/{folder_id}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["count"].as_u64(), Some(2));

    let response = app
        .request("GET", &format!("/api/content/{note_id}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let trash = app
        .request("GET", "/api/content/trash", None, Some(&token))
        .await;
    let ids: Vec<&str> = trash.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["id"].as_str())
        .collect();
    assert!(ids.contains(&folder_id.as_str()));

    // Restore brings back exactly the cohort deleted together.
    let response = app
        .request(
            "POST",
            &format!("/api/content/{folder_id}/restore"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["count"].as_u64(), Some(2));

    let response = app
        .request("GET", &format!("/api/content/{note_id}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // Purge only accepts trashed nodes.
    let response = app
        .request(
            "DELETE",
            &format!("/api/content/{folder_id}/purge"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    app.request("DELETE", &format!("/api/content/{folder_id}"), None, Some(&token))
        .await;
    let response = app
        .request(
            "DELETE",
            &format!("/api/content/{folder_id}/purge"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("GET", &format!("/api/content/{folder_id}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn outline_collects_headings_in_order() {
    let app = TestApp::new().await;
    let token = writer(&app).await;

    let body = json!({
        "type": "doc",
        "content": [
            { "type": "heading", "attrs": { "level": 1 },
              "content": [{ "type": "text", "text": "Title" }] },
            { "type": "paragraph",
              "content": [{ "type": "text", "text": "prose" }] },
            { "type": "heading", "attrs": { "level": 2 },
              "content": [{ "type": "text", "text": "Section" }] },
        ]
    });

    let note = app
        .request(
            "POST",
            "/api/content/notes",
            Some(json!({ "parent_id": null, "title": "Outlined", "body": body })),
            Some(&token),
        )
        .await;
    let note_id = note.body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "GET",
            &format!("/api/content/{note_id}/outline"),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let outline = response.body["data"].as_array().unwrap();
    assert_eq!(outline.len(), 2);
    assert_eq!(outline[0]["level"].as_u64(), Some(1));
    assert_eq!(outline[0]["text"].as_str(), Some("Title"));
    assert_eq!(outline[1]["level"].as_u64(), Some(2));
    assert_eq!(outline[1]["text"].as_str(), Some("Section"));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn forged_parent_cycle_trips_the_depth_guard() {
    let app = TestApp::new().await;
    let token = writer(&app).await;

    let a = app
        .request(
            "POST",
            "/api/content/folders",
            Some(json!({ "parent_id": null, "title": "Ouroboros A" })),
            Some(&token),
        )
        .await
        .body["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let b = app
        .request(
            "POST",
            "/api/content/folders",
            Some(json!({ "parent_id": a, "title": "Ouroboros B" })),
            Some(&token),
        )
        .await
        .body["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // The move endpoint refuses cycles, so corrupt the pointer the way
    // a buggy migration would: point A back under its own child.
    sqlx::query("UPDATE content_nodes SET parent_id = $1 WHERE id = $2")
        .bind(b.parse::<uuid::Uuid>().unwrap())
        .bind(a.parse::<uuid::Uuid>().unwrap())
        .execute(&app.db_pool)
        .await
        .unwrap();

    // Creating a child under the cycle walks the parent chain and must
    // fail at the segment ceiling instead of looping forever.
    let response = app
        .request(
            "POST",
            "/api/content/notes",
            Some(json!({ "parent_id": a, "title": "Trapped", "body": null })),
            Some(&token),
        )
        .await;
    assert_eq!(
        response.status,
        StatusCode::UNPROCESSABLE_ENTITY,
        "{:?}",
        response.body
    );
    assert_eq!(response.body["error"].as_str(), Some("LIMIT_EXCEEDED"));
}

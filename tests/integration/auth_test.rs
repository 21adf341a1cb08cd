//! Integration tests for the authentication flow.

use axum::http::StatusCode;

use crate::helpers::{TestApp, unique_name};

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn login_returns_token_pair_and_profile() {
    let app = TestApp::new().await;
    let username = unique_name("login");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "username": username,
                "password": "Sunlit!Meadow42",
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert!(data["access_token"].is_string());
    assert!(data["refresh_token"].is_string());
    assert_eq!(data["user"]["username"].as_str(), Some(username.as_str()));
    assert_eq!(data["user"]["role"].as_str(), Some("member"));
    assert!(data["user"].get("password_hash").is_none());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn login_rejects_wrong_password() {
    let app = TestApp::new().await;
    let username = unique_name("wrongpw");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "username": username,
                "password": "not-the-password",
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"].as_str(), Some("UNAUTHORIZED"));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn login_rejects_unknown_user() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "username": unique_name("nobody"),
                "password": "Sunlit!Meadow42",
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn me_requires_a_token() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/auth/me", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("GET", "/api/auth/me", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn me_returns_the_logged_in_profile() {
    let app = TestApp::new().await;
    let username = unique_name("me");
    app.create_test_user(&username, "Sunlit!Meadow42", "admin")
        .await;
    let token = app.login(&username, "Sunlit!Meadow42").await;

    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["data"]["username"].as_str(),
        Some(username.as_str())
    );
    assert_eq!(response.body["data"]["role"].as_str(), Some("admin"));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn logout_invalidates_the_session() {
    let app = TestApp::new().await;
    let username = unique_name("logout");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;
    let token = app.login(&username, "Sunlit!Meadow42").await;

    let response = app
        .request("POST", "/api/auth/logout", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn refresh_rotates_both_tokens() {
    let app = TestApp::new().await;
    let username = unique_name("refresh");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;

    let login = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "username": username,
                "password": "Sunlit!Meadow42",
            })),
            None,
        )
        .await;
    let old_access = login.body["data"]["access_token"].as_str().unwrap().to_string();
    let old_refresh = login.body["data"]["refresh_token"].as_str().unwrap().to_string();

    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(serde_json::json!({ "refresh_token": old_refresh })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let new_access = response.body["data"]["access_token"].as_str().unwrap().to_string();
    assert_ne!(new_access, old_access);

    // The rotated access token works; the pre-rotation one does not.
    let response = app
        .request("GET", "/api/auth/me", None, Some(&new_access))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("GET", "/api/auth/me", None, Some(&old_access))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn refresh_token_reuse_terminates_the_session() {
    let app = TestApp::new().await;
    let username = unique_name("reuse");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;

    let login = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "username": username,
                "password": "Sunlit!Meadow42",
            })),
            None,
        )
        .await;
    let old_refresh = login.body["data"]["refresh_token"].as_str().unwrap().to_string();

    let first = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(serde_json::json!({ "refresh_token": old_refresh })),
            None,
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);
    let rotated_access = first.body["data"]["access_token"].as_str().unwrap().to_string();

    // Replaying the consumed refresh token kills the whole session.
    let replay = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(serde_json::json!({ "refresh_token": old_refresh })),
            None,
        )
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("GET", "/api/auth/me", None, Some(&rotated_access))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn failed_logins_lock_the_account() {
    let app = TestApp::new().await;
    let username = unique_name("lockout");
    app.create_test_user(&username, "Sunlit!Meadow42", "member")
        .await;

    for _ in 0..app.config.auth.max_failed_attempts {
        let response = app
            .request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({
                    "username": username,
                    "password": "wrong-every-time",
                })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    // Correct credentials are refused while the lockout stands.
    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "username": username,
                "password": "Sunlit!Meadow42",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

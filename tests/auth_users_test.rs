// ABOUTME: Integration tests for registration, login, token validation, and account administration
// ABOUTME: Exercises the auth and user routers through the assembled application router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Duration;
use common::{
    bearer, create_test_admin, create_test_server_resources, create_test_user, TEST_PASSWORD,
};
use helpers::axum_test::AxumTestRequest;
use repforge_server::routes::build_router;
use serde_json::{json, Value};

#[tokio::test]
async fn test_register_then_use_token() {
    let resources = create_test_server_resources().await.unwrap();
    let router = build_router(Arc::clone(&resources));

    let body: Value = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "email": "  New.Lifter@Example.com ",
            "password": "squats-every-day",
            "display_name": "New Lifter",
            "language": "fr-FR"
        }))
        .send(router.clone())
        .await
        .assert_status(StatusCode::CREATED)
        .json();

    assert_eq!(body["user"]["email"], "new.lifter@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert_eq!(body["user"]["language"], "fr");
    let token = body["token"].as_str().unwrap();

    let me: Value = AxumTestRequest::get("/api/users/me")
        .auth(&format!("Bearer {token}"))
        .send(router)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(me["display_name"], "New Lifter");
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let resources = create_test_server_resources().await.unwrap();
    let router = build_router(resources);
    let payload = json!({ "email": "dup@example.com", "password": "long-enough-pw" });

    AxumTestRequest::post("/api/auth/register")
        .json(&payload)
        .send(router.clone())
        .await
        .assert_status(StatusCode::CREATED);

    let body: Value = AxumTestRequest::post("/api/auth/register")
        .json(&json!({ "email": "DUP@example.com", "password": "long-enough-pw" }))
        .send(router.clone())
        .await
        .assert_status(StatusCode::CONFLICT)
        .json();
    assert_eq!(body["error"]["code"], "RESOURCE_ALREADY_EXISTS");

    AxumTestRequest::post("/api/auth/register")
        .json(&json!({ "email": "short@example.com", "password": "short" }))
        .send(router.clone())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::post("/api/auth/register")
        .json(&json!({ "email": "not-an-email", "password": "long-enough-pw" }))
        .send(router)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_success_and_failure() {
    let resources = create_test_server_resources().await.unwrap();
    let user = create_test_user(&resources.database).await.unwrap();
    let router = build_router(resources);

    let body: Value = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": user.email, "password": TEST_PASSWORD }))
        .send(router.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["user"]["id"], user.id.to_string());
    assert!(body["expires_at"].is_string());

    let body: Value = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": user.email, "password": "wrong-password" }))
        .send(router.clone())
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .json();
    assert_eq!(body["error"]["code"], "AUTH_INVALID");

    AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": "ghost@example.com", "password": TEST_PASSWORD }))
        .send(router)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_malformed_and_expired_tokens() {
    let resources = create_test_server_resources().await.unwrap();
    let user = create_test_user(&resources.database).await.unwrap();
    let router = build_router(Arc::clone(&resources));

    let body: Value = AxumTestRequest::get("/api/users/me")
        .send(router.clone())
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .json();
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

    AxumTestRequest::get("/api/users/me")
        .auth("Bearer not.a.jwt")
        .send(router.clone())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let expired = resources
        .auth_manager
        .generate_token_with_ttl(&user, Duration::hours(-1))
        .unwrap();
    let body: Value = AxumTestRequest::get("/api/users/me")
        .auth(&format!("Bearer {expired}"))
        .send(router)
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .json();
    assert_eq!(body["error"]["code"], "AUTH_EXPIRED");
}

#[tokio::test]
async fn test_deleted_user_token_is_rejected() {
    let resources = create_test_server_resources().await.unwrap();
    let user = create_test_user(&resources.database).await.unwrap();
    let token = bearer(&resources, &user);
    let router = build_router(Arc::clone(&resources));

    resources.database.users().delete(user.id).await.unwrap();

    AxumTestRequest::get("/api/users/me")
        .auth(&token)
        .send(router)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_profile() {
    let resources = create_test_server_resources().await.unwrap();
    let user = create_test_user(&resources.database).await.unwrap();
    let token = bearer(&resources, &user);
    let router = build_router(resources);

    let body: Value = AxumTestRequest::put("/api/users/me")
        .auth(&token)
        .json(&json!({ "display_name": " Iron Mike ", "language": "es" }))
        .send(router.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["display_name"], "Iron Mike");
    assert_eq!(body["language"], "es");

    let body: Value = AxumTestRequest::put("/api/users/me")
        .auth(&token)
        .json(&json!({ "display_name": "" }))
        .send(router)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert!(body["display_name"].is_null());
    assert_eq!(body["language"], "es");
}

#[tokio::test]
async fn test_admin_endpoints_require_admin() {
    let resources = create_test_server_resources().await.unwrap();
    let user = create_test_user(&resources.database).await.unwrap();
    let router = build_router(Arc::clone(&resources));

    let body: Value = AxumTestRequest::get("/api/users")
        .auth(&bearer(&resources, &user))
        .send(router)
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .json();
    assert_eq!(body["error"]["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn test_admin_manages_roles_and_keeps_last_admin() {
    let resources = create_test_server_resources().await.unwrap();
    let admin = create_test_admin(&resources.database).await.unwrap();
    let user = create_test_user(&resources.database).await.unwrap();
    let admin_token = bearer(&resources, &admin);
    let router = build_router(Arc::clone(&resources));

    let body: Value = AxumTestRequest::get("/api/users?limit=10")
        .auth(&admin_token)
        .send(router.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
    assert_eq!(body["limit"], 10);

    let body: Value = AxumTestRequest::put(&format!("/api/users/{}/role", admin.id))
        .auth(&admin_token)
        .json(&json!({ "role": "user" }))
        .send(router.clone())
        .await
        .assert_status(StatusCode::CONFLICT)
        .json();
    assert_eq!(body["error"]["code"], "RESOURCE_CONFLICT");

    AxumTestRequest::delete(&format!("/api/users/{}", admin.id))
        .auth(&admin_token)
        .send(router.clone())
        .await
        .assert_status(StatusCode::CONFLICT);

    let body: Value = AxumTestRequest::put(&format!("/api/users/{}/role", user.id))
        .auth(&admin_token)
        .json(&json!({ "role": "admin" }))
        .send(router.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["role"], "admin");

    // The promoted user's existing token gains admin rights immediately
    AxumTestRequest::get("/api/users")
        .auth(&bearer(&resources, &user))
        .send(router.clone())
        .await
        .assert_status(StatusCode::OK);

    AxumTestRequest::put(&format!("/api/users/{}/role", admin.id))
        .auth(&admin_token)
        .json(&json!({ "role": "user" }))
        .send(router.clone())
        .await
        .assert_status(StatusCode::OK);

    AxumTestRequest::delete(&format!("/api/users/{}", uuid::Uuid::new_v4()))
        .auth(&bearer(&resources, &user))
        .send(router)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ABOUTME: Integration tests for workout completion and the streak-aware XP award
// ABOUTME: Covers streak continue/increment/reset, clock skew, records, levels, and notifications
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use axum::{http::StatusCode, Router};
use chrono::{Duration, Utc};
use common::{
    bearer, create_test_admin, create_test_server_resources, create_test_server_resources_with,
    create_test_user, set_streak,
};
use helpers::axum_test::AxumTestRequest;
use repforge_server::config::gamification::GamificationConfig;
use repforge_server::database::users::User;
use repforge_server::resources::ServerResources;
use repforge_server::routes::build_router;
use serde_json::{json, Value};

struct TestEnv {
    resources: Arc<ServerResources>,
    router: Router,
    user: User,
    token: String,
}

async fn setup_with(resources: Arc<ServerResources>) -> TestEnv {
    let user = create_test_user(&resources.database).await.unwrap();
    let token = bearer(&resources, &user);
    let router = build_router(Arc::clone(&resources));
    TestEnv {
        resources,
        router,
        user,
        token,
    }
}

async fn setup() -> TestEnv {
    setup_with(create_test_server_resources().await.unwrap()).await
}

async fn create_exercise(env: &TestEnv, name: &str) -> String {
    let admin = create_test_admin(&env.resources.database).await.unwrap();
    let body: Value = AxumTestRequest::post("/api/exercises")
        .auth(&bearer(&env.resources, &admin))
        .json(&json!({
            "name": name,
            "category": "strength",
            "equipment": "barbell",
            "primary_muscles": ["chest"],
            "instructions": ["Lower the bar", "Press it up"]
        }))
        .send(env.router.clone())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    body["id"].as_str().unwrap().to_owned()
}

async fn create_workout(env: &TestEnv, body: &Value) -> String {
    let workout: Value = AxumTestRequest::post("/api/workouts")
        .auth(&env.token)
        .json(body)
        .send(env.router.clone())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    workout["id"].as_str().unwrap().to_owned()
}

async fn complete(env: &TestEnv, workout_id: &str) -> Value {
    AxumTestRequest::post(&format!("/api/workouts/{workout_id}/complete"))
        .auth(&env.token)
        .send(env.router.clone())
        .await
        .assert_status(StatusCode::OK)
        .json()
}

async fn xp_status(env: &TestEnv) -> Value {
    AxumTestRequest::get("/api/xp/me")
        .auth(&env.token)
        .send(env.router.clone())
        .await
        .assert_status(StatusCode::OK)
        .json()
}

async fn notification_kinds(env: &TestEnv) -> Vec<String> {
    let body: Value = AxumTestRequest::get("/api/notifications")
        .auth(&env.token)
        .send(env.router.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    body["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test]
async fn test_first_completion_starts_streak() {
    let env = setup().await;
    let workout_id = create_workout(&env, &json!({ "title": "Push day" })).await;

    let body = complete(&env, &workout_id).await;

    assert!(body["workout"]["completed_at"].is_string());
    let xp = &body["xp"];
    assert_eq!(xp["awarded_xp"], 100);
    assert_eq!(xp["streak_days"], 1);
    assert_eq!(xp["transition"], "continued");
    assert_eq!(xp["total_xp"], 100);
    assert_eq!(xp["entries"][0]["action"], "workout_completed");

    let status = xp_status(&env).await;
    assert_eq!(status["progress"]["total_xp"], 100);
    assert_eq!(status["current_streak_days"], 1);
    assert_eq!(status["streak_active"], true);
}

#[tokio::test]
async fn test_consecutive_day_increments_and_enters_tier() {
    let env = setup().await;
    set_streak(
        &env.resources.database,
        env.user.id,
        6,
        Utc::now() - Duration::days(1),
    )
    .await
    .unwrap();
    let workout_id = create_workout(&env, &json!({ "title": "Leg day" })).await;

    let body = complete(&env, &workout_id).await;

    let xp = &body["xp"];
    assert_eq!(xp["transition"], "incremented");
    assert_eq!(xp["streak_days"], 7);
    assert_eq!(xp["multiplier"], 1.05);
    assert_eq!(xp["awarded_xp"], 105);
    assert!(notification_kinds(&env)
        .await
        .contains(&"streak_milestone".to_owned()));
}

#[tokio::test]
async fn test_long_gap_resets_streak() {
    let env = setup().await;
    set_streak(
        &env.resources.database,
        env.user.id,
        40,
        Utc::now() - Duration::days(5),
    )
    .await
    .unwrap();
    let workout_id = create_workout(&env, &json!({ "title": "Comeback" })).await;

    let body = complete(&env, &workout_id).await;

    assert_eq!(body["xp"]["transition"], "reset");
    assert_eq!(body["xp"]["streak_days"], 1);
    assert_eq!(body["xp"]["awarded_xp"], 100);
}

#[tokio::test]
async fn test_clock_skew_completes_workout_without_xp() {
    let env = setup().await;
    set_streak(
        &env.resources.database,
        env.user.id,
        3,
        Utc::now() + Duration::hours(2),
    )
    .await
    .unwrap();
    let workout_id = create_workout(&env, &json!({ "title": "Time traveller" })).await;

    let body = complete(&env, &workout_id).await;

    assert!(body["xp"].is_null());
    assert!(body["workout"]["completed_at"].is_string());

    let status = xp_status(&env).await;
    assert_eq!(status["progress"]["total_xp"], 0);
    assert_eq!(status["current_streak_days"], 3);

    let history: Value = AxumTestRequest::get("/api/xp/history")
        .auth(&env.token)
        .send(env.router.clone())
        .await
        .json();
    assert!(history["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_completing_twice_conflicts() {
    let env = setup().await;
    let workout_id = create_workout(&env, &json!({ "title": "Once only" })).await;
    complete(&env, &workout_id).await;

    let body: Value = AxumTestRequest::post(&format!("/api/workouts/{workout_id}/complete"))
        .auth(&env.token)
        .send(env.router.clone())
        .await
        .assert_status(StatusCode::CONFLICT)
        .json();
    assert_eq!(body["error"]["code"], "RESOURCE_CONFLICT");

    assert_eq!(xp_status(&env).await["progress"]["total_xp"], 100);
}

#[tokio::test]
async fn test_level_up_emits_notification() {
    let gamification = GamificationConfig {
        xp_per_level: 100,
        ..GamificationConfig::default()
    };
    let env = setup_with(create_test_server_resources_with(gamification).await.unwrap()).await;
    let workout_id = create_workout(&env, &json!({ "title": "Level me" })).await;

    let body = complete(&env, &workout_id).await;

    assert_eq!(body["xp"]["level"], 2);
    assert_eq!(body["xp"]["leveled_up"], true);
    assert!(notification_kinds(&env).await.contains(&"level_up".to_owned()));
}

#[tokio::test]
async fn test_personal_record_adds_bonus_award() {
    let env = setup().await;
    let exercise_id = create_exercise(&env, "Bench Press").await;

    let first = create_workout(
        &env,
        &json!({
            "title": "Bench 1",
            "sets": [{ "exercise_id": exercise_id, "reps": 5, "weight_kg": 100.0 }]
        }),
    )
    .await;
    let body = complete(&env, &first).await;
    assert!(body["personal_records"].as_array().unwrap().is_empty());

    let second = create_workout(
        &env,
        &json!({
            "title": "Bench 2",
            "sets": [
                { "exercise_id": exercise_id, "reps": 5, "weight_kg": 95.0 },
                { "exercise_id": exercise_id, "reps": 3, "weight_kg": 110.0 }
            ]
        }),
    )
    .await;
    let body = complete(&env, &second).await;

    assert_eq!(body["personal_records"], json!([exercise_id]));
    let entries = body["xp"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["action"], "personal_record");
    assert_eq!(body["xp"]["awarded_xp"], 150);
    assert_eq!(body["xp"]["total_xp"], 250);
}

#[tokio::test]
async fn test_program_session_uses_program_base_xp() {
    let env = setup().await;
    let exercise_id = create_exercise(&env, "Squat").await;
    let admin = create_test_admin(&env.resources.database).await.unwrap();

    let program: Value = AxumTestRequest::post("/api/programs")
        .auth(&bearer(&env.resources, &admin))
        .json(&json!({
            "title": "Starter Strength",
            "duration_weeks": 4,
            "sessions_per_week": 3,
            "is_published": true,
            "sessions": [{
                "week": 1, "day": 1, "title": "A",
                "exercises": [{ "exercise_id": exercise_id, "sets": 3, "reps": 5 }]
            }]
        }))
        .send(env.router.clone())
        .await
        .assert_status(StatusCode::CREATED)
        .json();

    let workout_id = create_workout(
        &env,
        &json!({
            "title": "Week 1 Day 1",
            "program_id": program["id"],
            "session_index": 0
        }),
    )
    .await;
    let body = complete(&env, &workout_id).await;

    assert_eq!(body["xp"]["entries"][0]["action"], "program_session_completed");
    assert_eq!(body["xp"]["awarded_xp"], 150);
}

#[tokio::test]
async fn test_concurrent_completions_both_count() {
    let env = setup().await;
    let a = create_workout(&env, &json!({ "title": "AM" })).await;
    let b = create_workout(&env, &json!({ "title": "PM" })).await;

    let (first, second) = tokio::join!(complete(&env, &a), complete(&env, &b));
    assert!(first["xp"].is_object());
    assert!(second["xp"].is_object());

    let status = xp_status(&env).await;
    assert_eq!(status["progress"]["total_xp"], 200);
    assert_eq!(status["current_streak_days"], 1);
}

#[tokio::test]
async fn test_workouts_are_private_to_owner() {
    let env = setup().await;
    let workout_id = create_workout(&env, &json!({ "title": "Mine" })).await;
    let other = create_test_user(&env.resources.database).await.unwrap();
    let other_token = bearer(&env.resources, &other);

    AxumTestRequest::get(&format!("/api/workouts/{workout_id}"))
        .auth(&other_token)
        .send(env.router.clone())
        .await
        .assert_status(StatusCode::NOT_FOUND);
    AxumTestRequest::delete(&format!("/api/workouts/{workout_id}"))
        .auth(&other_token)
        .send(env.router.clone())
        .await
        .assert_status(StatusCode::NOT_FOUND);
    AxumTestRequest::post(&format!("/api/workouts/{workout_id}/complete"))
        .auth(&other_token)
        .send(env.router.clone())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    AxumTestRequest::delete(&format!("/api/workouts/{workout_id}"))
        .auth(&env.token)
        .send(env.router.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_workout_with_unknown_exercise_rejected() {
    let env = setup().await;
    let body: Value = AxumTestRequest::post("/api/workouts")
        .auth(&env.token)
        .json(&json!({
            "title": "Ghost lifts",
            "sets": [{ "exercise_id": uuid::Uuid::new_v4(), "reps": 5 }]
        }))
        .send(env.router.clone())
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

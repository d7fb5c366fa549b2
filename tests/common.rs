// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory database, server resources, and user/token helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `repforge_server`

use std::sync::{Arc, Once};

use anyhow::Result;
use chrono::{DateTime, Utc};
use repforge_core::i18n::Language;
use repforge_server::{
    auth::hash_password,
    config::{
        environment::{AuthConfig, CorsConfig, Environment, ServerConfig},
        gamification::GamificationConfig,
    },
    database::{
        users::{NewUser, User, UserRole},
        Database,
    },
    resources::ServerResources,
};
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Password given to every test user
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    Ok(Database::new("sqlite::memory:").await?)
}

/// Server configuration suitable for tests
pub fn create_test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        database_url: "sqlite::memory:".into(),
        auth: AuthConfig {
            jwt_secret: "test-secret-test-secret-test-secret-0123".into(),
            jwt_expiry_hours: 24,
            bcrypt_cost: 4,
        },
        cors: CorsConfig {
            allowed_origins: "*".into(),
        },
        environment: Environment::Testing,
    }
}

/// Server resources over a fresh in-memory database with default gamification rules
pub async fn create_test_server_resources() -> Result<Arc<ServerResources>> {
    create_test_server_resources_with(GamificationConfig::default()).await
}

/// Server resources with explicit gamification rules
pub async fn create_test_server_resources_with(
    gamification: GamificationConfig,
) -> Result<Arc<ServerResources>> {
    let database = create_test_database().await?;
    Ok(Arc::new(ServerResources::new(
        database,
        create_test_config(),
        gamification,
    )?))
}

async fn create_user_with_role(database: &Database, email: &str, role: UserRole) -> Result<User> {
    let password_hash = hash_password(TEST_PASSWORD.into(), 4).await?;
    Ok(database
        .users()
        .create(NewUser {
            email: email.to_owned(),
            password_hash,
            display_name: None,
            role,
            language: Language::En,
        })
        .await?)
}

/// Create a regular test user with a unique email
pub async fn create_test_user(database: &Database) -> Result<User> {
    let email = format!("user-{}@example.com", Uuid::new_v4().simple());
    create_user_with_role(database, &email, UserRole::User).await
}

/// Create an admin test user with a unique email
pub async fn create_test_admin(database: &Database) -> Result<User> {
    let email = format!("admin-{}@example.com", Uuid::new_v4().simple());
    create_user_with_role(database, &email, UserRole::Admin).await
}

/// `Authorization` header value for a user
pub fn bearer(resources: &ServerResources, user: &User) -> String {
    let token = resources.auth_manager.generate_token(user).unwrap();
    format!("Bearer {token}")
}

/// Overwrite a user's stored streak snapshot
pub async fn set_streak(
    database: &Database,
    user_id: Uuid,
    streak_days: u32,
    last_activity_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "UPDATE user_progress SET current_streak_days = $1, last_activity_at = $2 WHERE user_id = $3",
    )
    .bind(i64::from(streak_days))
    .bind(last_activity_at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
    .bind(user_id.to_string())
    .execute(database.pool())
    .await?;
    Ok(())
}
